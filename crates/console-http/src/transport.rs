//! Transport abstraction between the client pipeline and the network
//!
//! The transport sends one descriptor and reports a tagged outcome. A 2xx
//! answer is `Ok(HttpResponse)`; anything else is a `TransportFailure`
//! variant the error router can match on directly:
//! - `Http`: the server answered with a non-2xx status
//! - `Connectivity`: the request went out but no response came back
//! - `Exception`: the request could not be built or sent at all
//!
//! Uses `Pin<Box<dyn Future>>` return types so the client can hold an
//! `Arc<dyn Transport>` and tests can swap in scripted transports.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::debug;

use crate::descriptor::{Body, RequestDescriptor};

/// A 2xx response with its raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// What went wrong before a 2xx response was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    Http { status: u16, body: String },
    Connectivity {
        signal: ConnectivitySignal,
        message: String,
    },
    Exception { cause: String },
}

/// Low-level signal reported with a connectivity failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivitySignal {
    /// Configured timeout elapsed or the request was aborted.
    Timeout,
    /// Host unreachable, DNS failure, connection refused.
    Unreachable,
    Other,
}

pub type TransportResult = std::result::Result<HttpResponse, TransportFailure>;

pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = TransportResult> + Send + 'a>>;
}

/// reqwest-backed transport rooted at the API base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build a transport with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers())
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Wrap an existing client (shared connection pool, custom TLS).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute(&self, request: &RequestDescriptor) -> TransportResult {
        let url = self.url_for(&request.path);
        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Raw(text) => {
                let builder = if request.headers.contains_key(CONTENT_TYPE) {
                    builder
                } else {
                    builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                };
                builder.body(text.clone())
            }
        };

        let response = builder.send().await.map_err(failure_from)?;
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Err(body_read_failure(status, e)),
        };

        debug!(status = status.as_u16(), url = %url, "transport response");

        if status.is_success() {
            Ok(HttpResponse {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(TransportFailure::Http {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = TransportResult> + Send + 'a>> {
        Box::pin(self.execute(request))
    }
}

fn default_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// The body of a response whose status already arrived could not be read.
///
/// A non-2xx status is still an HTTP answer, so it routes by status with an
/// empty body; a 2xx that lost its body is a connectivity failure.
fn body_read_failure(status: reqwest::StatusCode, error: reqwest::Error) -> TransportFailure {
    if status.is_success() {
        return failure_from(error);
    }
    debug!(status = status.as_u16(), error = %error, "response body unreadable");
    TransportFailure::Http {
        status: status.as_u16(),
        body: String::new(),
    }
}

/// Map a reqwest error onto the transport failure taxonomy.
fn failure_from(error: reqwest::Error) -> TransportFailure {
    let message = error.to_string();
    if error.is_builder() {
        return TransportFailure::Exception { cause: message };
    }
    let signal = if error.is_timeout() {
        ConnectivitySignal::Timeout
    } else if error.is_connect() {
        ConnectivitySignal::Unreachable
    } else {
        ConnectivitySignal::Other
    };
    TransportFailure::Connectivity { signal, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let transport =
            ReqwestTransport::with_client(reqwest::Client::new(), "https://admin.example.com/api/");
        assert_eq!(
            transport.url_for("/usercenter/users"),
            "https://admin.example.com/api/usercenter/users"
        );
        assert_eq!(
            transport.url_for("base/dict"),
            "https://admin.example.com/api/base/dict"
        );
    }

    /// Serve one response whose body is cut short of its Content-Length.
    async fn truncated_response(status_line: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!("{status_line}\r\nContent-Length: 100\r\n\r\nshort");
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn unreadable_body_keeps_error_status() {
        let base = truncated_response("HTTP/1.1 401 Unauthorized").await;
        let transport = ReqwestTransport::new(base, Duration::from_secs(5)).unwrap();

        let failure = transport
            .send(&RequestDescriptor::get("/usercenter/users"))
            .await
            .unwrap_err();

        assert_eq!(
            failure,
            TransportFailure::Http {
                status: 401,
                body: String::new(),
            }
        );
    }

    #[tokio::test]
    async fn unreadable_success_body_is_connectivity() {
        let base = truncated_response("HTTP/1.1 200 OK").await;
        let transport = ReqwestTransport::new(base, Duration::from_secs(5)).unwrap();

        let failure = transport
            .send(&RequestDescriptor::get("/usercenter/users"))
            .await
            .unwrap_err();

        assert!(
            matches!(failure, TransportFailure::Connectivity { .. }),
            "got: {failure:?}"
        );
    }

    #[tokio::test]
    async fn invalid_url_is_an_exception() {
        let transport = ReqwestTransport::with_client(reqwest::Client::new(), "not a url");
        let request = RequestDescriptor::get("/x");
        let failure = transport.send(&request).await.unwrap_err();
        assert!(
            matches!(failure, TransportFailure::Exception { .. }),
            "got: {failure:?}"
        );
    }
}
