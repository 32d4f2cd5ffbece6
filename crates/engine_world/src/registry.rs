//! Entity registry — which entities are alive and what they are made of.
//!
//! The registry is the only place entity ids come from. For each live entity
//! it keeps the set of component type names attached to it; that set is what
//! `has_component` and queries consult. Entities are keyed in id order, so a
//! query is one linear scan with no sort.

use std::collections::{BTreeMap, HashSet};

use engine_component::{EntityAllocator, EntityId, QuerySignature};

/// Live entities and their component sets.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    /// Entity ID allocator. Survives [`clear`](Self::clear).
    allocator: EntityAllocator,
    /// Component type names attached to each live entity.
    entities: BTreeMap<EntityId, HashSet<String>>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new id and mark it alive with no components.
    pub fn create(&mut self) -> EntityId {
        let id = self.allocator.allocate();
        self.entities.insert(id, HashSet::new());
        id
    }

    /// Forget a live entity, returning the component set it had.
    pub fn destroy(&mut self, id: EntityId) -> Option<HashSet<String>> {
        self.entities.remove(&id)
    }

    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    #[must_use]
    pub fn has(&self, id: EntityId, component: &str) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|set| set.contains(component))
    }

    /// The component set of a live entity.
    #[must_use]
    pub fn components(&self, id: EntityId) -> Option<&HashSet<String>> {
        self.entities.get(&id)
    }

    /// Record that `id` now has `component`. Returns `true` if the set grew.
    pub fn attach(&mut self, id: EntityId, component: &str) -> bool {
        match self.entities.get_mut(&id) {
            Some(set) if !set.contains(component) => set.insert(component.to_string()),
            _ => false,
        }
    }

    /// Record that `id` no longer has `component`. Returns `true` if it had it.
    pub fn detach(&mut self, id: EntityId, component: &str) -> bool {
        self.entities
            .get_mut(&id)
            .is_some_and(|set| set.remove(component))
    }

    /// Live entities satisfying `signature`, in ascending id order.
    #[must_use]
    pub fn matching(&self, signature: &QuerySignature) -> Vec<EntityId> {
        if signature.is_all() {
            return self.entities.keys().copied().collect();
        }
        self.entities
            .iter()
            .filter(|(_, set)| signature.matches(set))
            .map(|(id, _)| *id)
            .collect()
    }

    /// All live ids, ascending.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.matching(&QuerySignature::all())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Forget every entity. Ids already handed out stay retired.
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
