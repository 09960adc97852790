/**
 * Configuration constants for polling and the result cache
 */
use std::time::Duration;

/// Default delay between status fetches
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Default deadline for delete waits in seconds
pub const DEFAULT_DELETE_DEADLINE_SECS: u64 = 120;

/// Default delay between event-log fetches
pub const DEFAULT_EVENT_POLL_PERIOD_SECS: u64 = 5;

/// Consecutive empty event polls before falling back to a direct status fetch
pub const EMPTY_POLLS_BEFORE_STATUS_FALLBACK: u32 = 2;

/// Default freshness window for cached read results
pub const DEFAULT_CACHE_TTL_SECS: u64 = 120;

/// Buffer size for the per-key single-flight broadcast channel
pub const IN_FLIGHT_CHANNEL_CAPACITY: usize = 8;

/// Failure status assumed when a caller does not name any
pub const DEFAULT_FAILURE_STATUS: &str = "ERROR";

/// Status attribute consulted when a caller does not name one
pub const DEFAULT_STATUS_ATTRIBUTE: &str = "status";

/// Tunable knobs for a [`Session`](crate::session::Session)
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between status fetches
    pub poll_interval: Duration,
    /// Deadline applied to delete waits
    pub delete_deadline: Duration,
    /// Delay between event-log fetches
    pub event_poll_period: Duration,
    /// Freshness window for cached read results
    pub cache_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            delete_deadline: Duration::from_secs(DEFAULT_DELETE_DEADLINE_SECS),
            event_poll_period: Duration::from_secs(DEFAULT_EVENT_POLL_PERIOD_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

/// Validate configuration constants at compile time
const _: () = {
    assert!(
        DEFAULT_POLL_INTERVAL_SECS > 0,
        "DEFAULT_POLL_INTERVAL_SECS must be greater than 0"
    );
    assert!(
        DEFAULT_DELETE_DEADLINE_SECS > 0,
        "DEFAULT_DELETE_DEADLINE_SECS must be greater than 0"
    );
    assert!(
        DEFAULT_EVENT_POLL_PERIOD_SECS > 0,
        "DEFAULT_EVENT_POLL_PERIOD_SECS must be greater than 0"
    );
    assert!(
        EMPTY_POLLS_BEFORE_STATUS_FALLBACK > 0,
        "EMPTY_POLLS_BEFORE_STATUS_FALLBACK must be greater than 0"
    );
    assert!(
        IN_FLIGHT_CHANNEL_CAPACITY > 0,
        "IN_FLIGHT_CHANNEL_CAPACITY must be greater than 0"
    );
};
