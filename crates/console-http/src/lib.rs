//! Authenticated HTTP client for the admin console
//!
//! Wraps the console's backend gateway behind one request pipeline:
//! 1. `interceptor` attaches `Authorization: Bearer <access>` from the session
//! 2. `transport` sends the request (reqwest, or any `Transport` impl)
//! 3. `classify` accepts a 2xx only when its envelope carries the success code
//! 4. `router` turns every other outcome into a `ClassifiedError`
//! 5. on a 401, `refresh` runs a single-flight token refresh and `retry`
//!    replays the original request once with the new credentials
//!
//! `presenter` renders classified errors through an injected `Notifier`.

pub mod auth;
pub mod classify;
pub mod client;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod interceptor;
pub mod metrics;
pub mod presenter;
pub mod refresh;
pub mod retry;
pub mod router;
pub mod transport;

pub use classify::{ErrorClass, STATUS_TABLE, StatusRule, status_rule};
pub use client::{ClientConfig, HttpClient, service_path};
pub use descriptor::{Body, RequestDescriptor};
pub use envelope::Envelope;
pub use error::{ClassifiedError, Result};
pub use presenter::{ErrorPresenter, Notifier, PresentOptions, Presentation};
pub use refresh::RefreshCoordinator;
pub use transport::{
    ConnectivitySignal, HttpResponse, ReqwestTransport, Transport, TransportFailure,
    TransportResult,
};
