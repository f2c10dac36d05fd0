//! Single-flight token refresh
//!
//! When several requests hit a 401 together, exactly one of them (the
//! leader) calls the refresh endpoint. The others park on a oneshot channel
//! and receive the leader's outcome: the new pair, or `None` when the refresh
//! failed. The coordinator is an ordinary value owned by the client, so tests
//! and embedders can hold independent instances.
//!
//! State lives behind a std mutex that is never held across an await.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use common::Secret;
use console_auth::{Session, TokenPair};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::metrics;

type Waiter = oneshot::Sender<Option<TokenPair>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

/// What a caller does after registering with the coordinator.
enum Role {
    Leader(Secret<String>),
    Waiter(oneshot::Receiver<Option<TokenPair>>),
    NoToken,
}

#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain a fresh token pair, calling `refresh_call` at most once across
    /// all concurrent callers.
    ///
    /// Returns `Ok(None)` when there is no refresh token or when this caller
    /// waited on a refresh that failed. The leader gets the refresh error
    /// itself. On success the session holds the new pair before any waiter
    /// is released.
    pub async fn refresh<F, Fut>(&self, session: &Session, refresh_call: F) -> Result<Option<TokenPair>>
    where
        F: FnOnce(Secret<String>) -> Fut,
        Fut: Future<Output = Result<TokenPair>>,
    {
        let refresh_token = match self.join(session) {
            Role::Waiter(rx) => {
                debug!("refresh in flight, waiting for its outcome");
                return Ok(rx.await.ok().flatten());
            }
            Role::NoToken => {
                debug!("no refresh token, cannot refresh");
                metrics::record_refresh("no_token");
                return Ok(None);
            }
            Role::Leader(token) => token,
        };

        let mut in_flight = InFlight {
            coordinator: self,
            settled: false,
        };

        match refresh_call(refresh_token).await {
            Ok(pair) => {
                session.establish(&pair);
                info!("access token refreshed");
                metrics::record_refresh("success");
                in_flight.settle(Some(pair.clone()));
                Ok(Some(pair))
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                metrics::record_refresh("failure");
                in_flight.settle(None);
                Err(e)
            }
        }
    }

    /// Whether a refresh call is currently outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    fn join(&self, session: &Session) -> Role {
        let mut state = self.lock();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            return Role::Waiter(rx);
        }
        match session.refresh_token() {
            Some(token) => {
                state.in_flight = true;
                Role::Leader(token)
            }
            None => Role::NoToken,
        }
    }

    /// Release every waiter with `outcome` and return to idle.
    fn release(&self, outcome: Option<TokenPair>) {
        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        debug!(waiters = waiters.len(), success = outcome.is_some(), "releasing refresh waiters");
        for waiter in waiters {
            // A waiter whose caller went away has nothing to receive.
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &state.in_flight)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

/// Leader's claim on the in-flight slot. Dropping it unsettled (the leading
/// future was cancelled) releases waiters with `None`.
struct InFlight<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(&mut self, outcome: Option<TokenPair>) {
        self.settled = true;
        self.coordinator.release(outcome);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("refresh leader dropped before completing");
            self.coordinator.release(None);
        }
    }
}
