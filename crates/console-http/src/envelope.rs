//! Wire envelope wrapping every backend response body
//!
//! `{ statusCode, message, payload, traceId? }`. The business status code is
//! independent of the HTTP status: a 200 response can carry a rejection.
//! Older services still emit `code`/`data`; both spellings decode.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifiedError, Result};

/// Decoded response envelope. The payload stays untyped until the caller
/// asks for a concrete type.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(alias = "code")]
    pub status_code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "data")]
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

pub(crate) const MALFORMED_BODY: &str = "malformed response body";
pub(crate) const MALFORMED_PAYLOAD: &str = "malformed response payload";

impl Envelope {
    pub fn success(success_code: i64, payload: serde_json::Value) -> Self {
        Self {
            status_code: success_code,
            message: "success".into(),
            payload,
            trace_id: None,
        }
    }

    /// Decode the payload into the caller's type.
    pub fn into_payload<T: DeserializeOwned>(self) -> Result<T> {
        let trace_id = self.trace_id;
        serde_json::from_value(self.payload).map_err(|e| {
            tracing::debug!(error = %e, "payload does not match requested type");
            ClassifiedError::transport_traced(MALFORMED_PAYLOAD, trace_id)
        })
    }
}

/// Lenient view of an error body. Any field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    #[serde(default, alias = "code")]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
}

impl ErrorBody {
    /// Parse an error body; non-JSON or non-object bodies yield an empty result.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Both a status code and a message are present.
    pub fn is_envelope(&self) -> bool {
        self.status_code.is_some() && self.message.is_some()
    }

    /// The server's message, if it sent a non-empty one.
    pub fn server_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_canonical_field_names() {
        let env: Envelope = serde_json::from_str(
            r#"{"statusCode":200,"message":"ok","payload":{"id":7},"traceId":"abc"}"#,
        )
        .unwrap();
        assert_eq!(env.status_code, 200);
        assert_eq!(env.payload["id"], 7);
        assert_eq!(env.trace_id.as_deref(), Some("abc"));
    }

    #[test]
    fn decodes_legacy_field_names() {
        let env: Envelope =
            serde_json::from_str(r#"{"code":40001,"message":"duplicate","data":null}"#).unwrap();
        assert_eq!(env.status_code, 40001);
        assert_eq!(env.message, "duplicate");
        assert!(env.payload.is_null());
    }

    #[test]
    fn missing_payload_is_null() {
        let env: Envelope = serde_json::from_str(r#"{"statusCode":200,"message":"ok"}"#).unwrap();
        assert!(env.payload.is_null());
        env.into_payload::<()>().unwrap();
    }

    #[test]
    fn payload_type_mismatch_is_transport_error() {
        let env = Envelope {
            trace_id: Some("t".into()),
            ..Envelope::success(200, serde_json::json!("not a number"))
        };
        let err = env.into_payload::<u64>().unwrap_err();
        assert_eq!(
            err,
            ClassifiedError::transport_traced("malformed response payload", Some("t".into()))
        );
    }

    #[test]
    fn error_body_detects_envelope_shape() {
        let parsed = ErrorBody::parse(r#"{"code":1003,"message":"locked"}"#);
        assert!(parsed.is_envelope());
        assert_eq!(parsed.server_message(), Some("locked"));

        let partial = ErrorBody::parse(r#"{"message":"nginx says no"}"#);
        assert!(!partial.is_envelope());
        assert_eq!(partial.server_message(), Some("nginx says no"));
    }

    #[test]
    fn html_error_body_is_empty() {
        let parsed = ErrorBody::parse("<html>502 Bad Gateway</html>");
        assert!(!parsed.is_envelope());
        assert_eq!(parsed.server_message(), None);
    }

    #[test]
    fn error_body_ignores_empty_message() {
        let parsed = ErrorBody::parse(r#"{"statusCode":403,"message":""}"#);
        assert!(parsed.is_envelope());
        assert_eq!(parsed.server_message(), None);
    }
}
