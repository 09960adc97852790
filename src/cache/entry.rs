use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// What the single in-flight computation for a key produced. Broadcast to
/// every caller attached to the slot.
#[derive(Debug, Clone)]
pub enum ComputeOutcome<V> {
    Ready(V),
    Failed(String),
}

/// One cache slot.
///
/// `InFlight` exists only between the first caller's request and the
/// completion of the single underlying computation for that key; every
/// concurrent caller for the same key attaches to its channel instead of
/// computing. Settlement replaces the slot with `Settled` before any
/// waiter is woken, so a waiter never observes a half-settled entry.
#[derive(Debug)]
pub enum Slot<V> {
    Settled(SettledEntry<V>),
    InFlight {
        /// Identifies this computation across invalidations; a late
        /// settlement whose generation no longer matches is delivered to
        /// waiters but not stored
        generation: u64,
        tx: broadcast::Sender<ComputeOutcome<V>>,
    },
}

#[derive(Debug, Clone)]
pub struct SettledEntry<V> {
    pub value: V,
    pub stored_at: Instant,
}

impl<V> SettledEntry<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    /// Freshness is judged against the caller's TTL at lookup time, not a
    /// TTL fixed at store time: differing read paths may tolerate
    /// differing staleness for the same key.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }

    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }
}
