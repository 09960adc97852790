//! Synchronous-looking client core for eventually-consistent cloud
//! control planes.
//!
//! The backends this library talks to acknowledge a mutation long before
//! the resource settles; reads may return stale or transitional state for
//! a while afterwards. This crate hides that behind a simple call
//! contract with two coupled pieces:
//!
//! - [`poll`] blocks a logical caller until a remote resource reaches a
//!   target state or a failure state - by status attribute
//!   ([`poll::wait_for_status`], [`poll::wait_for_delete`]) or by
//!   incremental event log with a status fallback
//!   ([`poll::poll_for_completion`]).
//! - [`cache`] de-duplicates concurrent identical reads against the same
//!   slow, rate-limited backend ([`cache::ResultCache`]) and drops
//!   entries precisely when a mutating call is known to have changed
//!   server state ([`cache::InvalidationRouter`]).
//!
//! [`session::Session`] ties both to a [`cloud::Transport`] with an
//! explicit construction and teardown boundary.

pub mod cache;
pub mod cloud;
pub mod config;
pub mod error;
pub mod poll;
pub mod session;

pub use cache::{CacheError, CacheKey, InvalidationRouter, ResultCache};
pub use cloud::{EventRecord, Fetch, ResourceRef, ResourceState, RestTransport, Transport};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use poll::{Completion, DeleteSpec, PollError, PollSpec};
pub use session::Session;
