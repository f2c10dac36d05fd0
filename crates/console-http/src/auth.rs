//! Login and logout against the user center

use console_auth::{LOGIN_PATH, LOGOUT_PATH, LoginRequest, LogoutRequest, TokenResponse};
use tracing::{info, warn};

use crate::client::HttpClient;
use crate::descriptor::RequestDescriptor;
use crate::error::{ClassifiedError, Result};

impl HttpClient {
    /// Exchange credentials for a token pair and start a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let body = serde_json::to_value(LoginRequest { username, password })
            .map_err(|e| ClassifiedError::transport(format!("failed to encode login request: {e}")))?;
        let tokens: TokenResponse = self
            .request(RequestDescriptor::post(LOGIN_PATH).with_json(body))
            .await?;

        info!(
            username,
            access_expires_in = tokens.access_token_expires_in,
            "logged in"
        );
        self.session().establish(&tokens.into_pair());
        Ok(())
    }

    /// Revoke the refresh token server-side and forget local credentials.
    ///
    /// Local credentials are cleared even when the server call fails; the
    /// server's error is still returned.
    pub async fn logout(&self) -> Result<()> {
        let outcome = match self.session().refresh_token() {
            Some(refresh) => {
                let body = serde_json::to_value(LogoutRequest {
                    refresh_token: refresh.expose(),
                })
                .map_err(|e| {
                    ClassifiedError::transport(format!("failed to encode logout request: {e}"))
                });
                match body {
                    Ok(body) => self
                        .execute(RequestDescriptor::post(LOGOUT_PATH).with_json(body))
                        .await
                        .map(|_| ()),
                    Err(e) => Err(e),
                }
            }
            None => Ok(()),
        };

        if let Err(e) = &outcome {
            warn!(error = %e, "server-side logout failed, clearing local session anyway");
        }
        self.session().end();
        info!("logged out");
        outcome
    }
}
