//! Outgoing request interceptor: attaches the bearer token

use common::Secret;
use console_auth::{BEARER_PREFIX, Session};
use tracing::debug;

use crate::descriptor::RequestDescriptor;
use crate::transport::TransportFailure;

/// Set `Authorization: Bearer <token>` when the session holds an access
/// token; otherwise leave the request untouched. Returns the access token
/// that was attached, if any.
///
/// The only failure is a token that cannot be encoded as a header value,
/// reported as an `Exception` so it classifies like any other pre-send error.
pub fn attach_credentials(
    request: &mut RequestDescriptor,
    session: &Session,
) -> Result<Option<Secret<String>>, TransportFailure> {
    let Some(token) = session.access_token() else {
        debug!(path = %request.path, "no access token, sending unauthenticated");
        return Ok(None);
    };

    request
        .set_bearer(&format!("{BEARER_PREFIX}{}", token.expose()))
        .map_err(|e| TransportFailure::Exception {
            cause: format!("invalid access token: {e}"),
        })?;
    Ok(Some(token))
}
