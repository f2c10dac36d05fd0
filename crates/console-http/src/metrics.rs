//! Client counters
//!
//! Recorded through the `metrics` facade; they are no-ops until the host
//! process installs a recorder.
//!
//! - `console_http_requests_total` (counter): label `outcome` (`success` | `error`)
//! - `console_http_errors_total` (counter): label `kind` (`business` | `transport`)
//! - `console_http_token_refresh_total` (counter): label `result`
//!   (`success` | `failure` | `no_token`)

/// Record a finished logical request (retries count once).
pub fn record_outcome(outcome: &'static str) {
    metrics::counter!("console_http_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!("console_http_errors_total", "kind" => kind).increment(1);
}

pub fn record_refresh(result: &'static str) {
    metrics::counter!("console_http_token_refresh_total", "result" => result).increment(1);
}
