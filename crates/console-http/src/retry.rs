//! Retry executor: rewrites a rejected request for its single replay
//!
//! After a successful refresh the original descriptor is replayed with the
//! new access token. A body that itself carries `refreshToken` (logout, for
//! instance) gets the new refresh token too, whether the body is structured
//! JSON or a JSON-encoded string. The client enforces the one-replay limit.

use console_auth::TokenPair;
use tracing::debug;

use crate::descriptor::{Body, RequestDescriptor};
use crate::transport::TransportFailure;

const REFRESH_TOKEN_FIELD: &str = "refreshToken";

/// Clone `request` with credentials from `tokens`.
pub fn with_new_credentials(
    request: &RequestDescriptor,
    tokens: &TokenPair,
) -> Result<RequestDescriptor, TransportFailure> {
    let mut retried = request.clone();

    retried
        .set_bearer(&tokens.bearer())
        .map_err(|e| TransportFailure::Exception {
            cause: format!("invalid access token: {e}"),
        })?;

    if !tokens.refresh.is_empty() {
        replace_refresh_token(&mut retried.body, tokens.refresh.expose());
    }

    Ok(retried)
}

fn replace_refresh_token(body: &mut Body, refresh: &str) {
    match body {
        Body::Json(serde_json::Value::Object(map)) if map.contains_key(REFRESH_TOKEN_FIELD) => {
            map.insert(REFRESH_TOKEN_FIELD.into(), refresh.into());
            debug!("replaced refreshToken in JSON body");
        }
        Body::Raw(text) => {
            let Ok(serde_json::Value::Object(mut map)) = serde_json::from_str(text) else {
                return;
            };
            if !map.contains_key(REFRESH_TOKEN_FIELD) {
                return;
            }
            map.insert(REFRESH_TOKEN_FIELD.into(), refresh.into());
            if let Ok(encoded) = serde_json::to_string(&map) {
                *text = encoded;
                debug!("replaced refreshToken in encoded body");
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replaces_header_and_json_body_field() {
        let mut original =
            RequestDescriptor::post("/usercenter/auth/logout").with_json(json!({"refreshToken": "R1"}));
        original.set_bearer("Bearer A1").unwrap();

        let retried = with_new_credentials(&original, &TokenPair::new("A2", "R2")).unwrap();

        assert_eq!(retried.authorization(), Some("Bearer A2"));
        assert_eq!(retried.body, Body::Json(json!({"refreshToken": "R2"})));
        assert_eq!(original.authorization(), Some("Bearer A1"));
    }

    #[test]
    fn replaces_field_in_encoded_body() {
        let original = RequestDescriptor::post("/usercenter/auth/logout")
            .with_raw_body(r#"{"refreshToken":"R1","device":"cli"}"#);

        let retried = with_new_credentials(&original, &TokenPair::new("A2", "R2")).unwrap();

        let Body::Raw(text) = &retried.body else {
            panic!("body kind changed: {:?}", retried.body);
        };
        let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed, json!({"refreshToken": "R2", "device": "cli"}));
    }

    #[test]
    fn leaves_unrelated_bodies_alone() {
        let json_body = RequestDescriptor::post("/base/dict").with_json(json!({"name": "x"}));
        let retried = with_new_credentials(&json_body, &TokenPair::new("A2", "R2")).unwrap();
        assert_eq!(retried.body, Body::Json(json!({"name": "x"})));

        let raw = RequestDescriptor::post("/base/dict").with_raw_body("plain text");
        let retried = with_new_credentials(&raw, &TokenPair::new("A2", "R2")).unwrap();
        assert_eq!(retried.body, Body::Raw("plain text".into()));
    }

    #[test]
    fn empty_refresh_token_skips_body_rewrite() {
        let original =
            RequestDescriptor::post("/usercenter/auth/logout").with_json(json!({"refreshToken": "R1"}));
        let retried = with_new_credentials(&original, &TokenPair::new("A2", "")).unwrap();
        assert_eq!(retried.authorization(), Some("Bearer A2"));
        assert_eq!(retried.body, Body::Json(json!({"refreshToken": "R1"})));
    }
}
