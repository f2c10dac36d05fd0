//! Replayable description of one outgoing request
//!
//! A descriptor is everything needed to send (and, after a token refresh,
//! re-send) a call: method, gateway-relative path, headers, query and body.
//! It never holds the base URL; the transport owns that.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};

/// Request body as the caller supplied it.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    /// Structured JSON, serialized by the transport.
    Json(serde_json::Value),
    /// Pre-encoded text, usually JSON, sent verbatim.
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path relative to the API base URL, including the service prefix.
    pub path: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn with_raw_body(mut self, body: impl Into<String>) -> Self {
        self.body = Body::Raw(body.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set `Authorization`, marking the value sensitive so it never shows up
    /// in Debug output.
    pub fn set_bearer(&mut self, bearer: &str) -> Result<(), InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(bearer)?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Whether this request targets `endpoint` (query string ignored).
    pub fn targets(&self, endpoint: &str) -> bool {
        let path = self.path.split('?').next().unwrap_or_default();
        path.trim_end_matches('/') == endpoint.trim_end_matches('/')
    }
}
