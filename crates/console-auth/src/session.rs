//! Session lifecycle: establish on login/refresh, expire on auth failure
//!
//! `Session` wraps the injected credential store and the session-expired
//! callback. Expiry is latched: the first `expire()` clears the store and
//! fires the callback, later calls are no-ops until `establish()` re-arms it.
//! Concurrent 401s therefore redirect to login once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::Secret;
use tracing::{debug, info, warn};

use crate::credentials::CredentialStore;
use crate::token::TokenPair;

/// Callback invoked when the session can no longer be recovered.
///
/// Implementations typically navigate to the login surface; they must be
/// safe to call when already there.
pub trait SessionExpiredHandler: Send + Sync {
    fn session_expired(&self);
}

impl<F> SessionExpiredHandler for F
where
    F: Fn() + Send + Sync,
{
    fn session_expired(&self) {
        self()
    }
}

/// Credential store plus latched expiry state.
pub struct Session {
    store: Arc<dyn CredentialStore>,
    on_expired: Arc<dyn SessionExpiredHandler>,
    expired: AtomicBool,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>, on_expired: Arc<dyn SessionExpiredHandler>) -> Self {
        Self {
            store,
            on_expired,
            expired: AtomicBool::new(false),
        }
    }

    pub fn access_token(&self) -> Option<Secret<String>> {
        self.store.access_token()
    }

    pub fn refresh_token(&self) -> Option<Secret<String>> {
        self.store.refresh_token()
    }

    /// Store a fresh token pair and re-arm expiry handling.
    pub fn establish(&self, tokens: &TokenPair) {
        self.store
            .set_tokens(tokens.access.expose(), tokens.refresh.expose());
        if self.expired.swap(false, Ordering::SeqCst) {
            info!("session re-established");
        }
    }

    /// Clear credentials and notify the handler, once per session.
    pub fn expire(&self) {
        if self.expired.swap(true, Ordering::SeqCst) {
            debug!("session already expired, skipping handler");
            return;
        }
        warn!("session expired, clearing credentials");
        self.store.clear_tokens();
        self.on_expired.session_expired();
    }

    /// Forget credentials without invoking the expiry handler (logout).
    pub fn end(&self) {
        self.store.clear_tokens();
        debug!("session ended");
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("expired", &self.is_expired())
            .field("has_access", &self.store.access_token().is_some())
            .finish()
    }
}
