//! Terminal rendering of console errors

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use console_http::Notifier;

/// Writes toasts and modals to a terminal stream (stderr in the binary).
pub struct TerminalNotifier<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> TerminalNotifier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn write_line(&self, line: &str) {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{line}") {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> Notifier for TerminalNotifier<W> {
    // A terminal line does not expire; the duration only matters to GUIs.
    fn toast(&self, message: &str, _duration: Duration) {
        self.write_line(&format!("error: {message}"));
    }

    fn modal(&self, title: &str, message: &str) {
        self.write_line(&format!("== {title} =="));
        self.write_line(message);
    }
}
