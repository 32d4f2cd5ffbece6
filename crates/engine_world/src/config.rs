//! World configuration.

use serde::{Deserialize, Serialize};

/// How cached query results are discarded when entity composition changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidationPolicy {
    /// Every structural mutation empties the whole cache.
    Global,
    /// Only signatures that name the changed component type are evicted;
    /// entity creation and destruction evict the all-entities signature.
    #[default]
    PerType,
}

/// Configuration for a [`World`](crate::World).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Keep query results between calls. When `false` every query is
    /// recomputed.
    pub cache_queries: bool,
    /// Eviction strategy for the query cache.
    pub invalidation: InvalidationPolicy,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cache_queries: true,
            invalidation: InvalidationPolicy::default(),
        }
    }
}

impl WorldConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn query caching on or off.
    #[must_use]
    pub fn with_cache_queries(mut self, enabled: bool) -> Self {
        self.cache_queries = enabled;
        self
    }

    /// Choose the cache eviction strategy.
    #[must_use]
    pub fn with_invalidation(mut self, policy: InvalidationPolicy) -> Self {
        self.invalidation = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();
        assert!(config.cache_queries);
        assert_eq!(config.invalidation, InvalidationPolicy::PerType);
    }

    #[test]
    fn test_policy_deserializes_kebab_case() {
        let policy: InvalidationPolicy = serde_json::from_str("\"per-type\"").unwrap();
        assert_eq!(policy, InvalidationPolicy::PerType);
        let config: WorldConfig =
            serde_json::from_str(r#"{"cache_queries": false, "invalidation": "global"}"#).unwrap();
        assert!(!config.cache_queries);
        assert_eq!(config.invalidation, InvalidationPolicy::Global);
    }
}
