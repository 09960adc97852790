/**
Explicit ownership boundary for one client's caching and polling state.

A `Session` owns the result cache, the invalidation router, and a handle
to the transport. Construction and teardown are the embedding client's
call - dropping the session drops the cache with it. Nothing here is a
process-wide singleton.
*/
use crate::cache::{CacheKey, CacheStats, InvalidationRouter, ResultCache};
use crate::cloud::resource::{ResourceRef, ResourceState};
use crate::cloud::transport::Transport;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::poll::{self, Completion, DeleteSpec, PollSpec};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub struct Session<T: Transport> {
    transport: Arc<T>,
    cache: ResultCache<Value>,
    router: InvalidationRouter,
    config: SessionConfig,
}

impl<T: Transport> Session<T> {
    #[must_use]
    pub fn new(transport: T, router: InvalidationRouter) -> Self {
        Self::with_config(transport, router, SessionConfig::default())
    }

    #[must_use]
    pub fn with_config(transport: T, router: InvalidationRouter, config: SessionConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            cache: ResultCache::new(),
            router,
            config,
        }
    }

    /// Handle to the transport, for compute closures that need it
    #[must_use]
    pub fn transport(&self) -> Arc<T> {
        self.transport.clone()
    }

    /// Cache-guarded read with the session's default TTL.
    ///
    /// Key derivation normalizes argument order, so call sites may pass
    /// filters however they assemble them. Concurrent identical reads
    /// share one underlying call.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying read fails; cache trouble
    /// itself never surfaces as an error
    pub async fn read<F, Fut>(
        &self,
        operation: &str,
        args: &[(&str, &str)],
        compute: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        self.read_with_ttl(operation, args, self.config.cache_ttl, compute)
            .await
    }

    /// Cache-guarded read with an explicit freshness window
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying read fails
    pub async fn read_with_ttl<F, Fut>(
        &self,
        operation: &str,
        args: &[(&str, &str)],
        ttl: Duration,
        compute: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let key = CacheKey::new(operation, args);
        Ok(self.cache.get_or_compute(&key, ttl, compute).await?)
    }

    /// Report that a mutating call succeeded, before returning control to
    /// its caller. Resolves the operation through the rule table and
    /// drops the stale cache entries.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an operation with no declared rule
    pub fn mutated(&self, operation: &str) -> Result<usize> {
        self.router.on_mutation(&self.cache, operation)
    }

    /// Block until `resource` reaches the spec's target status. Always
    /// fetches fresh: no cache sits between the poll loop and the
    /// transport.
    ///
    /// # Errors
    ///
    /// See [`poll::wait_for_status`]
    pub async fn wait_for_status(
        &self,
        resource: &ResourceRef,
        spec: &PollSpec,
    ) -> Result<ResourceState> {
        Ok(poll::wait_for_status(self.transport.as_ref(), resource, spec).await?)
    }

    /// Block until `resource` no longer exists, using the session's
    /// interval and delete deadline
    ///
    /// # Errors
    ///
    /// See [`poll::wait_for_delete`]
    pub async fn wait_for_delete(&self, resource: &ResourceRef) -> Result<()> {
        let spec = DeleteSpec::default()
            .interval(self.config.poll_interval)
            .deadline(self.config.delete_deadline);
        Ok(poll::wait_for_delete(self.transport.as_ref(), resource, &spec).await?)
    }

    /// Block until the event log for `scope` reports a terminal status
    ///
    /// # Errors
    ///
    /// See [`poll::poll_for_completion`]
    pub async fn poll_for_completion(
        &self,
        scope: &ResourceRef,
        action: Option<&str>,
    ) -> Result<Completion> {
        Ok(poll::poll_for_completion(
            self.transport.as_ref(),
            scope,
            action,
            self.config.event_poll_period,
            None,
        )
        .await?)
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached read result
    pub fn invalidate_all(&self) {
        self.cache.clear();
    }
}
