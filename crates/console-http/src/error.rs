//! Classified request failures
//!
//! Every failed call ends as exactly one of two kinds, decided once at the
//! point where the cause is known:
//! - `Business`: the server understood the request and rejected it (envelope
//!   status != success, or a mapped status such as 403). Carries the server's
//!   code and message.
//! - `Transport`: no trustworthy business answer was obtained (timeout,
//!   unreachable host, unmapped status, malformed body).

/// A request failure, classified for callers and the error presenter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifiedError {
    #[error("{message}")]
    Business {
        status_code: i64,
        message: String,
        trace_id: Option<String>,
    },

    #[error("{message}")]
    Transport {
        message: String,
        trace_id: Option<String>,
    },
}

impl ClassifiedError {
    pub fn business(status_code: i64, message: impl Into<String>, trace_id: Option<String>) -> Self {
        Self::Business {
            status_code,
            message: message.into(),
            trace_id,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            trace_id: None,
        }
    }

    pub fn transport_traced(message: impl Into<String>, trace_id: Option<String>) -> Self {
        Self::Transport {
            message: message.into(),
            trace_id,
        }
    }

    /// Wrap an error that never went through classification.
    pub fn from_unknown(error: &(dyn std::error::Error + 'static)) -> Self {
        let message = error.to_string();
        if message.is_empty() {
            Self::transport(UNKNOWN_ERROR)
        } else {
            Self::transport(message)
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Business { message, .. } | Self::Transport { message, .. } => message,
        }
    }

    pub fn trace_id(&self) -> Option<&str> {
        match self {
            Self::Business { trace_id, .. } | Self::Transport { trace_id, .. } => trace_id.as_deref(),
        }
    }

    /// Server-assigned code, business errors only.
    pub fn status_code(&self) -> Option<i64> {
        match self {
            Self::Business { status_code, .. } => Some(*status_code),
            Self::Transport { .. } => None,
        }
    }

    pub fn is_business(&self) -> bool {
        matches!(self, Self::Business { .. })
    }

    /// Label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Business { .. } => "business",
            Self::Transport { .. } => "transport",
        }
    }
}

pub(crate) const UNKNOWN_ERROR: &str = "unknown error";

/// Result alias for client calls.
pub type Result<T> = std::result::Result<T, ClassifiedError>;
