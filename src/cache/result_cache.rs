use super::entry::{ComputeOutcome, SettledEntry, Slot};
use super::key::CacheKey;
use super::CacheError;
use crate::config::IN_FLIGHT_CHANNEL_CAPACITY;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Memoizes read results keyed by call identity, with caller-supplied
/// freshness, single-flight de-duplication, and explicit invalidation.
///
/// The slot map is the only concurrently-mutated state; its lock is held
/// for brief slot transitions only, never across the underlying compute
/// call. Failures of the cache layer itself degrade to a miss, never to
/// an error.
#[derive(Debug)]
pub struct ResultCache<V> {
    slots: Mutex<HashMap<CacheKey, Slot<V>>>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    joined_flights: AtomicU64,
}

enum Claim<V> {
    Hit(V),
    Join(broadcast::Receiver<ComputeOutcome<V>>),
    Lead {
        generation: u64,
        tx: broadcast::Sender<ComputeOutcome<V>>,
    },
}

impl<V: Clone + Send + Sync> ResultCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            joined_flights: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key` if one is settled and younger
    /// than `ttl`; otherwise run `compute` - or, when another caller is
    /// already running it for the same key, attach to that flight and
    /// receive its result. For N concurrent callers of an identical key,
    /// exactly one `compute` runs.
    ///
    /// A failed `compute` is never cached: the slot is cleared so the
    /// next caller retries, and every attached waiter sees the same
    /// [`CacheError::ComputeFailed`].
    ///
    /// # Errors
    ///
    /// - [`CacheError::ComputeFailed`] when the underlying computation
    ///   fails
    /// - [`CacheError::Abandoned`] when the leading caller went away
    ///   before settling; safe to retry
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = crate::error::Result<V>>,
    {
        let claim = self.claim(key, ttl);

        match claim {
            Claim::Hit(value) => Ok(value),
            Claim::Join(mut rx) => {
                self.joined_flights.fetch_add(1, Ordering::Relaxed);
                match rx.recv().await {
                    Ok(ComputeOutcome::Ready(value)) => Ok(value),
                    Ok(ComputeOutcome::Failed(message)) => {
                        Err(CacheError::ComputeFailed(message))
                    }
                    Err(_) => Err(CacheError::Abandoned),
                }
            }
            Claim::Lead { generation, tx } => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                let mut guard = LeaderGuard {
                    cache: self,
                    key,
                    generation,
                    armed: true,
                };

                // no lock is held across the compute call
                let outcome = compute().await;

                guard.armed = false;
                self.settle(key, generation, &tx, outcome)
            }
        }
    }

    /// Inspect the slot for `key` and decide this caller's role
    fn claim(&self, key: &CacheKey, ttl: Duration) -> Claim<V> {
        let mut slots = self.lock();
        match slots.get(key) {
            Some(Slot::Settled(entry)) if entry.is_fresh(ttl) => {
                debug!("🎯 Cache HIT: {} (age: {:?})", key, entry.age());
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Claim::Hit(entry.value.clone());
            }
            Some(Slot::InFlight { tx, .. }) => {
                debug!("⏳ Cache JOIN: {}", key);
                return Claim::Join(tx.subscribe());
            }
            Some(Slot::Settled(_)) => debug!("🔄 Cache STALE: {}", key),
            None => debug!("❌ Cache MISS: {}", key),
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let (tx, _rx) = broadcast::channel(IN_FLIGHT_CHANNEL_CAPACITY);
        slots.insert(
            key.clone(),
            Slot::InFlight {
                generation,
                tx: tx.clone(),
            },
        );
        Claim::Lead { generation, tx }
    }

    /// Replace our in-flight slot with the outcome and wake every waiter.
    ///
    /// Settlement happens before the broadcast, under one lock hold, so a
    /// waiter woken by the send can never observe the in-flight slot
    /// again. If invalidation dropped or replaced the slot while the
    /// compute ran, the result is still delivered to waiters but not
    /// stored - the once-stale read is the accepted cost.
    fn settle(
        &self,
        key: &CacheKey,
        generation: u64,
        tx: &broadcast::Sender<ComputeOutcome<V>>,
        outcome: crate::error::Result<V>,
    ) -> Result<V, CacheError> {
        let mut slots = self.lock();
        let still_ours = matches!(
            slots.get(key),
            Some(Slot::InFlight { generation: g, .. }) if *g == generation
        );

        match outcome {
            Ok(value) => {
                if still_ours {
                    debug!("💾 Cache STORE: {}", key);
                    slots.insert(key.clone(), Slot::Settled(SettledEntry::new(value.clone())));
                } else {
                    debug!("Cache slot for {} dropped mid-flight, not storing", key);
                }
                let _ = tx.send(ComputeOutcome::Ready(value.clone()));
                Ok(value)
            }
            Err(error) => {
                // failures are never cached; the next caller retries
                if still_ours {
                    slots.remove(key);
                }
                let message = error.to_string();
                warn!("cached read for {} failed: {}", key, message);
                let _ = tx.send(ComputeOutcome::Failed(message.clone()));
                Err(CacheError::ComputeFailed(message))
            }
        }
    }

    /// Drop every entry whose key starts with `prefix`, regardless of TTL
    /// or in-flight state. An in-flight computation is not cancelled: it
    /// settles, delivers to its waiters, and is not stored.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut slots = self.lock();
        let before = slots.len();
        slots.retain(|key, _| !key.matches_prefix(prefix));
        let dropped = before - slots.len();
        if dropped > 0 {
            debug!("🧹 Cache INVALIDATE: {} entries under \"{}\"", dropped, prefix);
        }
        dropped
    }

    /// Drop exactly one entry
    pub fn invalidate_key(&self, key: &CacheKey) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let slots = self.lock();
        let settled_entries = slots
            .values()
            .filter(|slot| matches!(slot, Slot::Settled(_)))
            .count();
        let in_flight_entries = slots.len() - settled_entries;
        CacheStats {
            settled_entries,
            in_flight_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            joined_flights: self.joined_flights.load(Ordering::Relaxed),
        }
    }

    /// A poisoned lock means a panic elsewhere; the map itself is still
    /// structurally sound, so keep serving rather than failing every read
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot<V>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone + Send + Sync> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears an abandoned in-flight slot so waiters unblock and the next
/// caller retries instead of queueing behind a computation that will
/// never settle.
struct LeaderGuard<'a, V> {
    cache: &'a ResultCache<V>,
    key: &'a CacheKey,
    generation: u64,
    armed: bool,
}

impl<V> Drop for LeaderGuard<'_, V> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slots = self
            .cache
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let ours = matches!(
            slots.get(self.key),
            Some(Slot::InFlight { generation, .. }) if *generation == self.generation
        );
        if ours {
            slots.remove(self.key);
            warn!("cached read for {} abandoned before settling", self.key);
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub settled_entries: usize,
    pub in_flight_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub joined_flights: u64,
}

impl CacheStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let reads = self.hits + self.misses + self.joined_flights;
        if reads == 0 {
            0.0
        } else {
            (self.hits + self.joined_flights) as f64 / reads as f64
        }
    }
}
