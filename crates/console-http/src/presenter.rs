//! Error presenter: shows a classified error to the operator
//!
//! Rendering is delegated to a `Notifier` so the same presenter drives a
//! terminal, a GUI shell, or a recording double in tests. Whatever the mode,
//! `present` returns the message that was (or would have been) shown.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::ClassifiedError;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);
pub const DEFAULT_MODAL_TITLE: &str = "Error";

/// Display surface for error messages.
pub trait Notifier: Send + Sync {
    /// Transient message that disappears after `duration`.
    fn toast(&self, message: &str, duration: Duration);

    /// Blocking dialog the operator must dismiss.
    fn modal(&self, title: &str, message: &str);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Presentation {
    Silent,
    #[default]
    Toast,
    Modal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentOptions {
    pub mode: Presentation,
    /// Shown instead of the error's own message.
    pub message: Option<String>,
    /// Modal title; ignored by the other modes.
    pub title: Option<String>,
    pub toast_duration: Duration,
}

impl Default for PresentOptions {
    fn default() -> Self {
        Self {
            mode: Presentation::Toast,
            message: None,
            title: None,
            toast_duration: DEFAULT_TOAST_DURATION,
        }
    }
}

impl PresentOptions {
    pub fn silent() -> Self {
        Self {
            mode: Presentation::Silent,
            ..Self::default()
        }
    }

    pub fn toast() -> Self {
        Self::default()
    }

    pub fn modal(title: impl Into<String>) -> Self {
        Self {
            mode: Presentation::Modal,
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }
}

#[derive(Clone)]
pub struct ErrorPresenter {
    notifier: Arc<dyn Notifier>,
}

impl ErrorPresenter {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Display `error` per `options` and return the displayed message.
    pub fn present(&self, error: &ClassifiedError, options: &PresentOptions) -> String {
        let message = options
            .message
            .clone()
            .unwrap_or_else(|| error.message().to_owned());

        debug!(
            kind = error.kind(),
            status_code = error.status_code(),
            trace_id = error.trace_id(),
            mode = ?options.mode,
            "presenting error"
        );

        match options.mode {
            Presentation::Silent => {}
            Presentation::Toast => self.notifier.toast(&message, options.toast_duration),
            Presentation::Modal => {
                let title = options.title.as_deref().unwrap_or(DEFAULT_MODAL_TITLE);
                self.notifier.modal(title, &message);
            }
        }
        message
    }

    /// Present an error that did not come out of the client pipeline.
    pub fn present_unknown(
        &self,
        error: &(dyn std::error::Error + 'static),
        options: &PresentOptions,
    ) -> String {
        self.present(&ClassifiedError::from_unknown(error), options)
    }
}

impl std::fmt::Debug for ErrorPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorPresenter").finish_non_exhaustive()
    }
}
