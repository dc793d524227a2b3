//! Opt-in retry with exponential backoff.
//!
//! Off unless the config has a `[retry]` section. Classifies request errors
//! (timeouts, throttling, connection failures, 5xx) and decides backoff so the
//! metadata and download stages share one policy.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
