use super::result_cache::ResultCache;
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, info};

/// Static mapping from one mutating operation to the key prefixes it
/// makes stale. Declared once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct InvalidationRule {
    pub operation: String,
    pub prefixes: Vec<String>,
}

/// Resolves "this mutating operation happened" into cache drops.
///
/// Consulted synchronously after a mutating call succeeds and before that
/// call returns to its caller. Invalidation is coarse and conservative: a
/// mutation whose effect cannot be precisely scoped registers the whole
/// listing-family prefix for its resource type rather than attempting
/// fine-grained diffing - dropping too much is always preferred over
/// serving stale data.
#[derive(Debug)]
pub struct InvalidationRouter {
    rules: HashMap<String, Vec<String>>,
}

impl InvalidationRouter {
    #[must_use]
    pub fn builder() -> InvalidationRouterBuilder {
        InvalidationRouterBuilder { rules: Vec::new() }
    }

    /// Drop every cache entry made stale by `operation`.
    ///
    /// Returns how many entries were dropped.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an operation identity with no declared
    /// rule. The table is static, so an unknown identity is a wiring bug
    /// in the embedding client, not a runtime condition.
    pub fn on_mutation<V: Clone + Send + Sync>(
        &self,
        cache: &ResultCache<V>,
        operation: &str,
    ) -> Result<usize> {
        let prefixes = self.rules.get(operation).ok_or_else(|| {
            Error::Config(format!(
                "no invalidation rule declared for mutating operation \"{operation}\""
            ))
        })?;

        let mut dropped = 0;
        for prefix in prefixes {
            dropped += cache.invalidate_prefix(prefix);
        }
        debug!(
            "mutation {} invalidated {} cache entries across {} prefixes",
            operation,
            dropped,
            prefixes.len()
        );
        Ok(dropped)
    }

    /// Whether `operation` has a declared rule
    #[must_use]
    pub fn knows(&self, operation: &str) -> bool {
        self.rules.contains_key(operation)
    }

    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

pub struct InvalidationRouterBuilder {
    rules: Vec<InvalidationRule>,
}

impl InvalidationRouterBuilder {
    /// Declare that `operation` invalidates every key under `prefixes`
    #[must_use]
    pub fn route(mut self, operation: &str, prefixes: &[&str]) -> Self {
        self.rules.push(InvalidationRule {
            operation: operation.to_string(),
            prefixes: prefixes.iter().map(ToString::to_string).collect(),
        });
        self
    }

    /// Validate and freeze the rule table.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on a duplicate operation identity or a
    /// rule with no prefixes - both are precondition violations caught
    /// here, at configuration time, rather than on a call path.
    pub fn build(self) -> Result<InvalidationRouter> {
        let mut rules: HashMap<String, Vec<String>> = HashMap::new();
        for rule in self.rules {
            if rule.prefixes.is_empty() {
                return Err(Error::Config(format!(
                    "invalidation rule for \"{}\" names no prefixes",
                    rule.operation
                )));
            }
            if rules.insert(rule.operation.clone(), rule.prefixes).is_some() {
                return Err(Error::Config(format!(
                    "duplicate invalidation rule for \"{}\"",
                    rule.operation
                )));
            }
        }
        info!("invalidation router ready ({} operations)", rules.len());
        Ok(InvalidationRouter { rules })
    }
}
