//! Shared types for the admin console workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
