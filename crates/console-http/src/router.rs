//! Error router: turns a transport failure into a classified error
//!
//! Routing is pure. It never touches the session or the network; a 401 comes
//! back as `Routed::Unauthorized` and the client decides between refresh and
//! expiry.
//!
//! Precedence for a server response:
//! 1. 401 → `Unauthorized`
//! 2. status in the fixed table → table class, server message if present
//! 3. envelope-shaped body → business error from the envelope
//! 4. anything else → transport error, server message or `request failed (<status>)`

use crate::classify::{ErrorClass, UNAUTHORIZED, status_rule, unauthorized_message};
use crate::envelope::ErrorBody;
use crate::error::{ClassifiedError, UNKNOWN_ERROR};
use crate::transport::{ConnectivitySignal, TransportFailure};

pub const TIMEOUT_MESSAGE: &str = "request timed out, please retry";
pub const UNREACHABLE_MESSAGE: &str = "network connection failed, check network settings";
pub const NETWORK_MESSAGE: &str = "network error, please retry";

/// Outcome of routing one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Authentication rejected; eligible for a token refresh.
    Unauthorized {
        message: String,
        trace_id: Option<String>,
    },
    Failed(ClassifiedError),
}

pub fn route_failure(failure: TransportFailure) -> Routed {
    match failure {
        TransportFailure::Http { status, body } => route_status(status, &body),
        TransportFailure::Connectivity { signal, message } => {
            Routed::Failed(ClassifiedError::transport(connectivity_message(signal, &message)))
        }
        TransportFailure::Exception { cause } => {
            let message = if cause.is_empty() {
                UNKNOWN_ERROR.to_owned()
            } else {
                cause
            };
            Routed::Failed(ClassifiedError::transport(message))
        }
    }
}

fn route_status(status: u16, body: &str) -> Routed {
    let parsed = ErrorBody::parse(body);
    let server_message = parsed.server_message().map(str::to_owned);

    if status == UNAUTHORIZED {
        return Routed::Unauthorized {
            message: server_message.unwrap_or_else(|| unauthorized_message().to_owned()),
            trace_id: parsed.trace_id,
        };
    }

    if let Some(rule) = status_rule(status) {
        let message = server_message.unwrap_or_else(|| rule.message.to_owned());
        let error = match rule.class {
            ErrorClass::Business => ClassifiedError::business(
                parsed.status_code.unwrap_or(i64::from(status)),
                message,
                parsed.trace_id,
            ),
            ErrorClass::Transport => ClassifiedError::transport_traced(message, parsed.trace_id),
        };
        return Routed::Failed(error);
    }

    if parsed.is_envelope()
        && let Some(code) = parsed.status_code
    {
        return Routed::Failed(ClassifiedError::business(
            code,
            parsed.message.unwrap_or_default(),
            parsed.trace_id,
        ));
    }

    let message = server_message.unwrap_or_else(|| format!("request failed ({status})"));
    Routed::Failed(ClassifiedError::transport_traced(message, parsed.trace_id))
}

/// Pick the user-facing message for a request that got no response.
///
/// The signal wins; the error text is a fallback for transports that only
/// report a message.
fn connectivity_message(signal: ConnectivitySignal, message: &str) -> &'static str {
    let lowered = message.to_ascii_lowercase();
    match signal {
        ConnectivitySignal::Timeout => TIMEOUT_MESSAGE,
        ConnectivitySignal::Unreachable => UNREACHABLE_MESSAGE,
        ConnectivitySignal::Other if lowered.contains("timeout") || lowered.contains("timed out") => {
            TIMEOUT_MESSAGE
        }
        ConnectivitySignal::Other if lowered.contains("network error") => UNREACHABLE_MESSAGE,
        ConnectivitySignal::Other => NETWORK_MESSAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, body: &str) -> TransportFailure {
        TransportFailure::Http {
            status,
            body: body.into(),
        }
    }

    fn failed(routed: Routed) -> ClassifiedError {
        match routed {
            Routed::Failed(e) => e,
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn unauthorized_uses_default_message() {
        assert_eq!(
            route_failure(http(401, "")),
            Routed::Unauthorized {
                message: "login expired, please log in again".into(),
                trace_id: None,
            }
        );
    }

    #[test]
    fn unauthorized_prefers_server_message() {
        let routed = route_failure(http(
            401,
            r#"{"statusCode":401,"message":"token revoked","traceId":"t-4"}"#,
        ));
        assert_eq!(
            routed,
            Routed::Unauthorized {
                message: "token revoked".into(),
                trace_id: Some("t-4".into()),
            }
        );
    }

    #[test]
    fn not_found_without_envelope_is_transport() {
        let err = failed(route_failure(http(404, "<html>Not Found</html>")));
        assert_eq!(err, ClassifiedError::transport("endpoint not found"));
    }

    #[test]
    fn forbidden_is_business_with_http_status() {
        let err = failed(route_failure(http(403, "")));
        assert_eq!(
            err,
            ClassifiedError::business(403, "no permission for this operation", None)
        );
    }

    #[test]
    fn mapped_status_keeps_server_code_and_message() {
        let err = failed(route_failure(http(
            403,
            r#"{"statusCode":40301,"message":"tenant locked"}"#,
        )));
        assert_eq!(err, ClassifiedError::business(40301, "tenant locked", None));
    }

    #[test]
    fn mapped_transport_status_uses_server_message() {
        let err = failed(route_failure(http(503, r#"{"message":"draining"}"#)));
        assert_eq!(err, ClassifiedError::transport("draining"));
    }

    #[test]
    fn unmapped_envelope_becomes_business() {
        let err = failed(route_failure(http(
            422,
            r#"{"statusCode":42201,"message":"invalid phone","payload":null,"traceId":"x"}"#,
        )));
        assert_eq!(
            err,
            ClassifiedError::business(42201, "invalid phone", Some("x".into()))
        );
    }

    #[test]
    fn unmapped_status_without_envelope() {
        let err = failed(route_failure(http(500, "boom")));
        assert_eq!(err, ClassifiedError::transport("request failed (500)"));
    }

    #[test]
    fn unmapped_status_with_bare_message() {
        let err = failed(route_failure(http(500, r#"{"message":"db down"}"#)));
        assert_eq!(err, ClassifiedError::transport("db down"));
    }

    #[test]
    fn connectivity_signals() {
        let cases = [
            (ConnectivitySignal::Timeout, "", TIMEOUT_MESSAGE),
            (ConnectivitySignal::Unreachable, "", UNREACHABLE_MESSAGE),
            (ConnectivitySignal::Other, "operation timed out", TIMEOUT_MESSAGE),
            (ConnectivitySignal::Other, "Network Error", UNREACHABLE_MESSAGE),
            (ConnectivitySignal::Other, "connection reset", NETWORK_MESSAGE),
        ];
        for (signal, message, expected) in cases {
            let err = failed(route_failure(TransportFailure::Connectivity {
                signal,
                message: message.into(),
            }));
            assert_eq!(err, ClassifiedError::transport(expected), "{signal:?} {message}");
        }
    }

    #[test]
    fn exception_keeps_cause_or_defaults() {
        let err = failed(route_failure(TransportFailure::Exception {
            cause: "builder error".into(),
        }));
        assert_eq!(err.message(), "builder error");

        let err = failed(route_failure(TransportFailure::Exception {
            cause: String::new(),
        }));
        assert_eq!(err.message(), "unknown error");
    }
}
