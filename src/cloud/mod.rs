pub mod event;
pub mod resource;
pub mod rest;
pub mod transport;

pub use event::{is_failed_status, is_terminal_status, EventRecord};
pub use resource::{Fetch, ResourceRef, ResourceState};
pub use rest::RestTransport;
pub use transport::Transport;

/// Default user agent - automatically uses the package version
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
