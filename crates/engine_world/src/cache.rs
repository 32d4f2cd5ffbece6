//! Query result cache.
//!
//! Results are keyed by [`QuerySignature`] and stored as `Rc<[EntityId]>`:
//! handing one out is a pointer copy, and nobody holding it can change what
//! the next caller sees.
//!
//! Invalidation happens synchronously inside every structural mutation, so a
//! cached entry is never observed stale.

use std::collections::HashMap;
use std::rc::Rc;

use engine_component::{EntityId, QuerySignature};
use tracing::trace;

use crate::config::{InvalidationPolicy, WorldConfig};

/// Cached query results plus hit/miss counters.
#[derive(Debug)]
pub struct QueryCache {
    entries: HashMap<QuerySignature, Rc<[EntityId]>>,
    enabled: bool,
    policy: InvalidationPolicy,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    #[must_use]
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            entries: HashMap::new(),
            enabled: config.cache_queries,
            policy: config.invalidation,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up `signature`, or compute and remember it.
    pub fn get_or_insert_with(
        &mut self,
        signature: QuerySignature,
        compute: impl FnOnce(&QuerySignature) -> Vec<EntityId>,
    ) -> Rc<[EntityId]> {
        if let Some(hit) = self.entries.get(&signature) {
            self.hits += 1;
            return Rc::clone(hit);
        }
        self.misses += 1;
        let result: Rc<[EntityId]> = compute(&signature).into();
        if self.enabled {
            trace!(signature = %signature, len = result.len(), "query cached");
            self.entries.insert(signature, Rc::clone(&result));
        }
        result
    }

    /// Composition of some entity changed for `component`.
    pub fn component_changed(&mut self, component: &str) {
        match self.policy {
            InvalidationPolicy::Global => self.entries.clear(),
            InvalidationPolicy::PerType => self.entries.retain(|sig, _| !sig.mentions(component)),
        }
    }

    /// An entity was created or destroyed.
    ///
    /// Under [`InvalidationPolicy::PerType`] only the all-entities signature
    /// can change: a new entity has no components yet, and a destroyed one has
    /// already had each component removed (and evicted) individually.
    pub fn entities_changed(&mut self) {
        match self.policy {
            InvalidationPolicy::Global => self.entries.clear(),
            InvalidationPolicy::PerType => {
                self.entries.remove(&QuerySignature::all());
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of signatures currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, signature: &QuerySignature) -> bool {
        self.entries.contains_key(signature)
    }

    /// `(hits, misses)` since the cache was built.
    #[must_use]
    pub fn counters(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(names: &[&str]) -> QuerySignature {
        QuerySignature::from_names(names.iter().copied())
    }

    fn filled(policy: InvalidationPolicy) -> QueryCache {
        let mut cache = QueryCache::new(&WorldConfig::new().with_invalidation(policy));
        for s in [sig(&[]), sig(&["A"]), sig(&["B"]), sig(&["A", "B"])] {
            cache.get_or_insert_with(s, |_| vec![EntityId(0)]);
        }
        cache
    }

    #[test]
    fn test_hit_returns_same_allocation() {
        let mut cache = QueryCache::new(&WorldConfig::default());
        let first = cache.get_or_insert_with(sig(&["A"]), |_| vec![EntityId(1)]);
        let second = cache.get_or_insert_with(sig(&["A"]), |_| unreachable!("should hit"));
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.counters(), (1, 1));
    }

    #[test]
    fn test_per_type_evicts_mentions_only() {
        let mut cache = filled(InvalidationPolicy::PerType);
        cache.component_changed("A");
        assert!(cache.contains(&sig(&[])));
        assert!(cache.contains(&sig(&["B"])));
        assert!(!cache.contains(&sig(&["A"])));
        assert!(!cache.contains(&sig(&["A", "B"])));

        cache.entities_changed();
        assert!(!cache.contains(&sig(&[])));
        assert!(cache.contains(&sig(&["B"])));
    }

    #[test]
    fn test_global_clears_everything() {
        let mut cache = filled(InvalidationPolicy::Global);
        cache.component_changed("unrelated");
        assert!(cache.is_empty());

        let mut cache = filled(InvalidationPolicy::Global);
        cache.entities_changed();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_never_stores() {
        let mut cache = QueryCache::new(&WorldConfig::new().with_cache_queries(false));
        cache.get_or_insert_with(sig(&["A"]), |_| vec![]);
        cache.get_or_insert_with(sig(&["A"]), |_| vec![]);
        assert!(cache.is_empty());
        assert_eq!(cache.counters(), (0, 2));
    }
}
