//! Authenticated HTTP client
//!
//! Every call runs the same pipeline: attach credentials, send, classify a
//! 2xx by its envelope, route anything else. A 401 on an ordinary endpoint
//! hands off to the refresh coordinator and, on success, replays the request
//! once with the new credentials. Anything still failing propagates as a
//! `ClassifiedError`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use common::Secret;
use console_auth::{REFRESH_PATH, RefreshRequest, Session, TokenPair, TokenResponse};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::classify::{UNAUTHORIZED, classify_response};
use crate::descriptor::RequestDescriptor;
use crate::envelope::Envelope;
use crate::error::{ClassifiedError, Result};
use crate::interceptor::attach_credentials;
use crate::metrics;
use crate::refresh::RefreshCoordinator;
use crate::retry::with_new_credentials;
use crate::router::{Routed, route_failure};
use crate::transport::{ReqwestTransport, Transport, TransportFailure, TransportResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_SUCCESS_CODE: i64 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API gateway root; request paths are appended to it.
    pub base_url: String,
    pub timeout: Duration,
    /// Envelope `statusCode` that marks success.
    pub success_code: i64,
    /// Endpoint that exchanges a refresh token; a 401 from it is terminal.
    pub refresh_path: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            success_code: DEFAULT_SUCCESS_CODE,
            refresh_path: REFRESH_PATH.to_owned(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_success_code(mut self, success_code: i64) -> Self {
        self.success_code = success_code;
        self
    }

    pub fn with_refresh_path(mut self, refresh_path: impl Into<String>) -> Self {
        self.refresh_path = refresh_path.into();
        self
    }
}

/// One send: the access token it carried and what came back.
struct Attempt {
    sent_token: Option<Secret<String>>,
    outcome: TransportResult,
}

/// Whether the single replay after a refresh has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryBudget {
    Available,
    Spent,
}

#[derive(Clone)]
pub struct HttpClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
    coordinator: Arc<RefreshCoordinator>,
}

impl HttpClient {
    /// Client over a reqwest transport rooted at `config.base_url`.
    pub fn new(config: ClientConfig, session: Arc<Session>) -> std::result::Result<Self, reqwest::Error> {
        let transport = ReqwestTransport::new(config.base_url.clone(), config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport), session))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            config,
            transport,
            session,
            coordinator: Arc::new(RefreshCoordinator::new()),
        }
    }

    /// Share a refresh coordinator with other clients on the same session.
    pub fn with_coordinator(mut self, coordinator: Arc<RefreshCoordinator>) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Run `request` through the full pipeline and return the success envelope.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4(), method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: RequestDescriptor) -> Result<Envelope> {
        let outcome = self.run(request).await;
        match &outcome {
            Ok(_) => metrics::record_outcome("success"),
            Err(e) => {
                debug!(kind = e.kind(), error = %e, "request failed");
                metrics::record_outcome("error");
                metrics::record_error(e.kind());
            }
        }
        outcome
    }

    /// Execute and decode the payload into `T`.
    pub async fn request<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T> {
        self.execute(request).await?.into_payload()
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        service: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let request = query.iter().fold(
            RequestDescriptor::get(service_path(service, path)),
            |req, (k, v)| req.with_query(*k, *v),
        );
        self.request(request).await
    }

    pub async fn post<T, B>(&self, service: &str, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(reqwest::Method::POST, service, path, body)
            .await
    }

    pub async fn put<T, B>(&self, service: &str, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(reqwest::Method::PUT, service, path, body)
            .await
    }

    pub async fn patch<T, B>(&self, service: &str, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(reqwest::Method::PATCH, service, path, body)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        service: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let request = query.iter().fold(
            RequestDescriptor::new(reqwest::Method::DELETE, service_path(service, path)),
            |req, (k, v)| req.with_query(*k, *v),
        );
        self.request(request).await
    }

    async fn send_with_body<T, B>(
        &self,
        method: reqwest::Method,
        service: &str,
        path: &str,
        body: &B,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.request(RequestDescriptor::new(method, service_path(service, path)).with_json(body))
            .await
    }

    async fn run(&self, mut request: RequestDescriptor) -> Result<Envelope> {
        let mut budget = RetryBudget::Available;
        loop {
            let attempt = self.dispatch(&request).await;
            let failure = match attempt.outcome {
                Ok(response) => return classify_response(&response, self.config.success_code),
                Err(failure) => failure,
            };

            let (message, trace_id) = match route_failure(failure) {
                Routed::Failed(e) => return Err(e),
                Routed::Unauthorized { message, trace_id } => (message, trace_id),
            };

            if request.targets(&self.config.refresh_path) {
                debug!("refresh endpoint rejected credentials");
                return Err(self.expire_session(message, trace_id));
            }
            if budget == RetryBudget::Spent {
                debug!("replayed request rejected again");
                return Err(self.expire_session(message, trace_id));
            }

            // A refresh finished while this attempt was in flight.
            if let Some(current) = self.rotated_since(attempt.sent_token.as_ref()) {
                debug!("credentials rotated since the attempt was sent, replaying");
                request = with_new_credentials(&request, &current).map_err(classify_local)?;
                budget = RetryBudget::Spent;
                continue;
            }

            let refreshed = self
                .coordinator
                .refresh(&self.session, |token| self.call_refresh(token))
                .await;

            match refreshed {
                Ok(Some(tokens)) => {
                    request = with_new_credentials(&request, &tokens).map_err(classify_local)?;
                    budget = RetryBudget::Spent;
                    debug!("replaying request with refreshed credentials");
                }
                Ok(None) => return Err(self.expire_session(message, trace_id)),
                Err(e) => {
                    warn!(error = %e, "refresh failed, ending session");
                    return Err(self.expire_session(message, trace_id));
                }
            }
        }
    }

    async fn dispatch(&self, request: &RequestDescriptor) -> Attempt {
        let mut outgoing = request.clone();
        let sent_token = match attach_credentials(&mut outgoing, &self.session) {
            Ok(token) => token,
            Err(failure) => {
                return Attempt {
                    sent_token: None,
                    outcome: Err(failure),
                };
            }
        };
        let outcome = self.transport.send(&outgoing).await;
        Attempt {
            sent_token,
            outcome,
        }
    }

    /// The session's tokens, when its access token is no longer the one `sent`.
    fn rotated_since(&self, sent: Option<&Secret<String>>) -> Option<TokenPair> {
        let current = self.session.access_token()?;
        if sent.is_some_and(|sent| sent.expose() == current.expose()) {
            return None;
        }
        let refresh = self
            .session
            .refresh_token()
            .map(|token| token.expose().clone())
            .unwrap_or_default();
        Some(TokenPair::new(current.expose().clone(), refresh))
    }

    /// Exchange `refresh_token` through the regular pipeline.
    ///
    /// Boxed because it re-enters `execute`.
    fn call_refresh(
        &self,
        refresh_token: Secret<String>,
    ) -> Pin<Box<dyn Future<Output = Result<TokenPair>> + Send + '_>> {
        Box::pin(async move {
            let body = json_body(&RefreshRequest {
                refresh_token: refresh_token.expose(),
            })?;
            let request = RequestDescriptor::post(self.config.refresh_path.clone()).with_json(body);
            let tokens: TokenResponse = self.execute(request).await?.into_payload()?;
            debug!(
                access_expires_in = tokens.access_token_expires_in,
                refresh_expires_in = tokens.refresh_token_expires_in,
                "refresh endpoint issued new tokens"
            );
            Ok(tokens.into_pair())
        })
    }

    fn expire_session(&self, message: String, trace_id: Option<String>) -> ClassifiedError {
        self.session.expire();
        ClassifiedError::business(i64::from(UNAUTHORIZED), message, trace_id)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// `service` prefix joined with a relative `path`.
pub fn service_path(service: &str, path: &str) -> String {
    let service = service.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        service.to_owned()
    } else {
        format!("{service}/{path}")
    }
}

/// Serialize a request body; an absent (null) body becomes `{}`.
fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value> {
    let value = serde_json::to_value(body).map_err(|e| {
        ClassifiedError::transport(format!("failed to encode request body: {e}"))
    })?;
    Ok(if value.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        value
    })
}

/// Classify a failure raised before anything was sent.
fn classify_local(failure: TransportFailure) -> ClassifiedError {
    match route_failure(failure) {
        Routed::Failed(e) => e,
        Routed::Unauthorized { message, trace_id } => {
            ClassifiedError::business(i64::from(UNAUTHORIZED), message, trace_id)
        }
    }
}
