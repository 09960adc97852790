use super::event::EventRecord;
use super::resource::{Fetch, ResourceRef, ResourceState};
use crate::error::Result;
use async_trait::async_trait;

/// The three primitives the core needs from a control-plane backend.
///
/// Implementations perform the actual network calls. The contract the
/// polling loops depend on:
///
/// - `fetch` must answer [`Fetch::Missing`] for a well-formed "not found"
///   and reserve the error channel for genuine faults, so delete waits
///   can tell success from a backend failure.
/// - `events_since` must return records in ascending time order and
///   tolerate an absent marker (meaning "from the beginning").
/// - `direct_status` is the escalation path for backends whose event feed
///   goes quiet near terminal state.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, resource: &ResourceRef) -> Result<Fetch>;

    async fn events_since(
        &self,
        scope: &ResourceRef,
        marker: Option<&str>,
    ) -> Result<Vec<EventRecord>>;

    async fn direct_status(&self, scope: &ResourceRef) -> Result<ResourceState>;
}
