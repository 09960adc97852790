use crate::config::{
    DEFAULT_DELETE_DEADLINE_SECS, DEFAULT_FAILURE_STATUS, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_STATUS_ATTRIBUTE,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Observer for backend-reported completion percentage. Invoked as a side
/// effect only; a panicking callback never aborts the poll.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Per-call configuration for [`wait_for_status`](crate::poll::wait_for_status).
///
/// Created fresh for each wait, never persisted. Status comparison is
/// case-sensitive and exact: differing backends use differing casing
/// conventions as part of their contract, so no normalization happens here.
#[derive(Clone)]
pub struct PollSpec {
    /// Status that ends the wait successfully
    pub target_status: String,
    /// Statuses that end the wait as a failure
    pub failure_statuses: HashSet<String>,
    /// Delay between fetches
    pub interval: Duration,
    /// Wall-clock budget relative to loop entry; `None` waits indefinitely
    pub deadline: Option<Duration>,
    /// Attribute on the fetched state that carries the lifecycle status
    pub status_attribute: String,
    pub progress_callback: Option<ProgressCallback>,
}

impl PollSpec {
    /// Spec that waits for `target_status`, failing on `ERROR`, fetching
    /// every 2s with no deadline, reading the `status` attribute.
    #[must_use]
    pub fn target(target_status: &str) -> Self {
        Self {
            target_status: target_status.to_string(),
            failure_statuses: HashSet::from([DEFAULT_FAILURE_STATUS.to_string()]),
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            deadline: None,
            status_attribute: DEFAULT_STATUS_ATTRIBUTE.to_string(),
            progress_callback: None,
        }
    }

    /// Add a status to the failure set
    #[must_use]
    pub fn failure_status(mut self, status: &str) -> Self {
        self.failure_statuses.insert(status.to_string());
        self
    }

    /// Replace the failure set entirely
    #[must_use]
    pub fn failure_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn status_attribute(mut self, attribute: &str) -> Self {
        self.status_attribute = attribute.to_string();
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.progress_callback = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for PollSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollSpec")
            .field("target_status", &self.target_status)
            .field("failure_statuses", &self.failure_statuses)
            .field("interval", &self.interval)
            .field("deadline", &self.deadline)
            .field("status_attribute", &self.status_attribute)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

/// Per-call configuration for [`wait_for_delete`](crate::poll::wait_for_delete).
#[derive(Clone)]
pub struct DeleteSpec {
    /// Delay between fetches
    pub interval: Duration,
    /// Wall-clock budget relative to loop entry
    pub deadline: Duration,
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DeleteSpec {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            deadline: Duration::from_secs(DEFAULT_DELETE_DEADLINE_SECS),
            progress_callback: None,
        }
    }
}

impl DeleteSpec {
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.progress_callback = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for DeleteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteSpec")
            .field("interval", &self.interval)
            .field("deadline", &self.deadline)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let spec = PollSpec::target("ACTIVE");
        assert_eq!(spec.target_status, "ACTIVE");
        assert!(spec.failure_statuses.contains("ERROR"));
        assert_eq!(spec.interval, Duration::from_secs(2));
        assert_eq!(spec.deadline, None);
        assert_eq!(spec.status_attribute, "status");
        assert!(spec.progress_callback.is_none());
    }

    #[test]
    fn test_failure_statuses_replace_default() {
        let spec = PollSpec::target("active").failure_statuses(["error", "degraded"]);
        assert!(!spec.failure_statuses.contains("ERROR"));
        assert!(spec.failure_statuses.contains("error"));
        assert!(spec.failure_statuses.contains("degraded"));
    }

    #[test]
    fn test_delete_spec_defaults() {
        let spec = DeleteSpec::default();
        assert_eq!(spec.interval, Duration::from_secs(2));
        assert_eq!(spec.deadline, Duration::from_secs(120));
    }
}
