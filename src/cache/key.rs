use itertools::Itertools;

/// Stable digest of one logical read: operation identity plus its
/// arguments in canonical order.
///
/// Two calls naming the same arguments in different insertion order
/// produce the same key, so filter maps are normalized (sorted by
/// argument name) before rendering. The rendered form is
/// `operation:name=value,name=value`, which keeps the operation identity
/// as a matchable prefix for coarse invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    #[must_use]
    pub fn new(operation: &str, args: &[(&str, &str)]) -> Self {
        let rendered = args
            .iter()
            .sorted_by_key(|(name, _)| *name)
            .map(|(name, value)| format!("{name}={value}"))
            .join(",");
        Self(format!("{operation}:{rendered}"))
    }

    /// Key for an argument-less operation
    #[must_use]
    pub fn bare(operation: &str) -> Self {
        Self::new(operation, &[])
    }

    /// The operation identity, usable as an invalidation prefix
    #[must_use]
    pub fn family(&self) -> &str {
        self.0.split(':').next().unwrap_or(&self.0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_order_is_irrelevant() {
        let a = CacheKey::new("list_servers", &[("name", "web"), ("zone", "az1")]);
        let b = CacheKey::new("list_servers", &[("zone", "az1"), ("name", "web")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_queries_get_distinct_keys() {
        let a = CacheKey::new("list_servers", &[("zone", "az1")]);
        let b = CacheKey::new("list_servers", &[("zone", "az2")]);
        let c = CacheKey::new("list_volumes", &[("zone", "az1")]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_family_prefix() {
        let key = CacheKey::new("list_servers", &[("zone", "az1")]);
        assert_eq!(key.family(), "list_servers");
        assert!(key.matches_prefix("list_servers:"));
        assert!(!key.matches_prefix("list_volumes:"));
    }

    #[test]
    fn test_bare_key() {
        assert_eq!(CacheKey::bare("list_flavors").as_str(), "list_flavors:");
    }
}
