//! Credentials and session state for the admin console
//!
//! Holds the access/refresh token pair the HTTP client attaches to requests,
//! persists it across restarts, and owns the "session expired" transition
//! that clears credentials and sends the operator back to login. This crate
//! performs no network I/O; the HTTP client drives it.
//!
//! Credential flow:
//! 1. `login` succeeds → `Session::establish()` stores the pair
//! 2. Request interceptor reads `Session::access_token()`
//! 3. 401 → refresh coordinator reads `Session::refresh_token()`
//! 4. Refresh succeeds → `Session::establish()` with the new pair
//! 5. Refresh fails → `Session::expire()` clears the store, fires the callback once

pub mod constants;
pub mod credentials;
pub mod error;
pub mod session;
pub mod token;

pub use constants::*;
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{Error, Result};
pub use session::{Session, SessionExpiredHandler};
pub use token::{LoginRequest, LogoutRequest, RefreshRequest, TokenPair, TokenResponse};
