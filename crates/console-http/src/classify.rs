//! Response classification and the fixed HTTP status table
//!
//! A 2xx response is only a success when its envelope carries the success
//! sentinel. Non-2xx statuses with a known meaning map to a fixed default
//! message and error class; the table is not configurable per call.

use tracing::debug;

use crate::envelope::{Envelope, MALFORMED_BODY};
use crate::error::{ClassifiedError, Result};
use crate::transport::HttpResponse;

/// Which side of the taxonomy a mapped status lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Business,
    Transport,
}

/// Default handling for one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRule {
    pub status: u16,
    pub message: &'static str,
    pub class: ErrorClass,
}

pub const UNAUTHORIZED: u16 = 401;

/// Known statuses. 401 is listed for its message; its routing goes through
/// token refresh instead of this table.
pub const STATUS_TABLE: &[StatusRule] = &[
    StatusRule {
        status: UNAUTHORIZED,
        message: "login expired, please log in again",
        class: ErrorClass::Business,
    },
    StatusRule {
        status: 403,
        message: "no permission for this operation",
        class: ErrorClass::Business,
    },
    StatusRule {
        status: 404,
        message: "endpoint not found",
        class: ErrorClass::Transport,
    },
    StatusRule {
        status: 405,
        message: "method not allowed",
        class: ErrorClass::Transport,
    },
    StatusRule {
        status: 502,
        message: "gateway failed to reach downstream",
        class: ErrorClass::Transport,
    },
    StatusRule {
        status: 503,
        message: "service unavailable",
        class: ErrorClass::Transport,
    },
    StatusRule {
        status: 504,
        message: "gateway timeout",
        class: ErrorClass::Transport,
    },
];

pub fn status_rule(status: u16) -> Option<&'static StatusRule> {
    STATUS_TABLE.iter().find(|rule| rule.status == status)
}

/// Default message for an expired or rejected login.
pub fn unauthorized_message() -> &'static str {
    status_rule(UNAUTHORIZED).map_or("login expired, please log in again", |r| r.message)
}

/// Accept a 2xx response whose envelope carries `success_code`.
///
/// Any other envelope status is a business rejection even though HTTP
/// reported success. A body that is not an envelope is a transport error.
pub fn classify_response(response: &HttpResponse, success_code: i64) -> Result<Envelope> {
    let envelope: Envelope = serde_json::from_str(&response.body).map_err(|e| {
        debug!(status = response.status, error = %e, "2xx body is not an envelope");
        ClassifiedError::transport(MALFORMED_BODY)
    })?;

    if envelope.status_code == success_code {
        return Ok(envelope);
    }

    debug!(
        status_code = envelope.status_code,
        trace_id = envelope.trace_id.as_deref(),
        "business rejection on 2xx response"
    );
    Err(ClassifiedError::business(
        envelope.status_code,
        envelope.message,
        envelope.trace_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.into(),
        }
    }

    #[test]
    fn success_sentinel_returns_envelope() {
        let env = classify_response(
            &ok(r#"{"statusCode":200,"message":"ok","payload":[1,2]}"#),
            200,
        )
        .unwrap();
        assert_eq!(env.payload, serde_json::json!([1, 2]));
    }

    #[test]
    fn non_success_on_http_200_is_business_error() {
        let err = classify_response(
            &ok(r#"{"statusCode":40010,"message":"username taken","payload":null,"traceId":"tr-9"}"#),
            200,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ClassifiedError::business(40010, "username taken", Some("tr-9".into()))
        );
    }

    #[test]
    fn configurable_success_sentinel() {
        let body = r#"{"statusCode":0,"message":"ok","payload":1}"#;
        assert!(classify_response(&ok(body), 0).is_ok());
        assert!(classify_response(&ok(body), 200).is_err());
    }

    #[test]
    fn non_envelope_body_is_transport_error() {
        let err = classify_response(&ok("<html>hi</html>"), 200).unwrap_err();
        assert_eq!(err, ClassifiedError::transport("malformed response body"));
    }

    #[test]
    fn table_matches_known_statuses() {
        assert_eq!(status_rule(403).unwrap().class, ErrorClass::Business);
        assert_eq!(status_rule(404).unwrap().message, "endpoint not found");
        for status in [405, 502, 503, 504] {
            assert_eq!(status_rule(status).unwrap().class, ErrorClass::Transport);
        }
        assert!(status_rule(500).is_none());
        assert!(status_rule(418).is_none());
    }

    #[test]
    fn unauthorized_default_message() {
        assert_eq!(unauthorized_message(), "login expired, please log in again");
    }
}
