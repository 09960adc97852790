pub mod entry;
pub mod invalidation;
pub mod key;
pub mod result_cache;

pub use invalidation::{InvalidationRouter, InvalidationRouterBuilder, InvalidationRule};
pub use key::CacheKey;
pub use result_cache::{CacheStats, ResultCache};

use thiserror::Error;

/// How a cache-guarded read failed.
///
/// Both variants are safe to retry: a failed computation is never stored,
/// and an abandoned flight leaves no slot behind. Cache-infrastructure
/// trouble never surfaces here at all - it degrades to a miss.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cached read computation failed: {0}")]
    ComputeFailed(String),

    #[error("cached read computation was abandoned before settling")]
    Abandoned,
}
