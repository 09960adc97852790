pub mod engine;
pub mod events;
pub mod spec;

pub use engine::{wait_for_delete, wait_for_status};
pub use events::{poll_for_completion, Completion};
pub use spec::{DeleteSpec, PollSpec, ProgressCallback};

use std::time::Duration;
use thiserror::Error;

/// How a wait ended without reaching its target.
///
/// `Timeout` is recoverable by retrying with a fresh deadline. `Failure`
/// surfaces the backend's own reason text and is not retried
/// automatically. The remaining variants are fatal: the polling loop
/// never retries a malformed response or an unexpected transport fault.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("timed out after {elapsed:?} waiting for {target} (last status: {last_status})")]
    Timeout {
        target: String,
        elapsed: Duration,
        last_status: String,
    },

    #[error("resource entered failure status {status}: {reason}")]
    Failure { status: String, reason: String },

    #[error("resource does not expose status attribute \"{attribute}\"")]
    MissingStatusAttribute { attribute: String },

    #[error("resource {resource} no longer exists")]
    Gone { resource: String },

    #[error("backend fault after {elapsed:?} (last status: {last_status}): {source}")]
    Fatal {
        elapsed: Duration,
        last_status: String,
        source: Box<crate::error::Error>,
    },
}
