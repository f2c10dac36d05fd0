//! Token payloads exchanged with the user center
//!
//! Wire shapes use camelCase field names. `TokenResponse` is the payload of
//! both the login and the refresh endpoint; the client converts it into a
//! `TokenPair` immediately so raw tokens never sit in plain `String`s longer
//! than the decode.

use common::Secret;
use serde::{Deserialize, Serialize};

/// Access/refresh token pair produced by login or refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: Secret<String>,
    pub refresh: Secret<String>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: Secret::new(access.into()),
            refresh: Secret::new(refresh.into()),
        }
    }

    /// `Bearer <access>` header value.
    pub fn bearer(&self) -> String {
        format!("{}{}", crate::BEARER_PREFIX, self.access.expose())
    }
}

/// Payload of the login and refresh endpoints.
///
/// Expirations are deltas in seconds. The console does not schedule refreshes
/// from them (refresh is driven by 401s), they are only logged.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub access_token_expires_in: u64,
    #[serde(default)]
    pub refresh_token_expires_in: u64,
}

impl TokenResponse {
    pub fn into_pair(self) -> TokenPair {
        TokenPair::new(self.access_token, self.refresh_token)
    }
}

/// Body of `POST <refresh-path>`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Body of `POST /usercenter/auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of `POST /usercenter/auth/logout`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest<'a> {
    pub refresh_token: &'a str,
}
