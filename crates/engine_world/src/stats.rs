//! World statistics for debug tooling.

use std::collections::BTreeSet;

use serde::Serialize;

/// A snapshot of world sizes, as returned by [`World::stats`](crate::World::stats).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorldStats {
    /// Live entities.
    pub entities: usize,
    /// Stored component payloads across all types.
    pub components: usize,
    /// Registered systems.
    pub systems: usize,
    /// Every declared component type name.
    pub component_types: BTreeSet<String>,
    /// Live change subscriptions.
    pub subscriptions: usize,
    /// Signatures currently held in the query cache.
    pub cached_queries: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl WorldStats {
    /// `true` when the world holds no entities, payloads, systems or
    /// subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities == 0 && self.components == 0 && self.systems == 0 && self.subscriptions == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_for_debug_overlay() {
        let stats = WorldStats {
            entities: 2,
            components: 3,
            component_types: ["Health".to_string()].into_iter().collect(),
            ..WorldStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["entities"], 2);
        assert_eq!(json["component_types"], serde_json::json!(["Health"]));
        assert!(!stats.is_empty());
        assert!(WorldStats::default().is_empty());
    }
}
