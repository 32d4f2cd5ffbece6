//! Entity identifiers and allocation.
//!
//! An [`EntityId`] is a lightweight `u64` identifier with no inherent data.
//! Whether an id is alive is decided by the world's registry, not by the id.

use serde::{Deserialize, Serialize};

/// A unique entity identifier.
///
/// Entities are pure identifiers — they carry no data of their own. Components
/// are attached to entities to give them meaning.
///
/// Ids are handed out in strictly increasing order starting at 0 and are never
/// reused, so a destroyed id can never alias a newer entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create an entity id from a raw `u64`.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Allocates monotonically increasing entity ids.
///
/// There is deliberately no free-list: an id that was handed out once is
/// never produced again for the lifetime of the allocator.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    next_id: u64,
}

impl EntityAllocator {
    /// Creates a new allocator. The first id handed out is `EntityId(0)`.
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Allocates a fresh entity id.
    pub fn allocate(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }

    /// Returns the number of ids allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id
    }

    /// The id the next call to [`allocate`](Self::allocate) will return.
    #[must_use]
    pub fn peek(&self) -> EntityId {
        EntityId(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_raw_roundtrip() {
        let e = EntityId::from_raw(42);
        assert_eq!(e.id(), 42);
        assert_eq!(e.to_string(), "Entity(42)");
    }

    #[test]
    fn test_allocator_starts_at_zero() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.peek(), EntityId(0));
        let e0 = alloc.allocate();
        let e1 = alloc.allocate();
        let e2 = alloc.allocate();
        assert_eq!(e0.id(), 0);
        assert_eq!(e1.id(), 1);
        assert_eq!(e2.id(), 2);
        assert_eq!(alloc.count(), 3);
    }

    #[test]
    fn test_entity_serializes_as_plain_number() {
        let json = serde_json::to_value(EntityId(7)).unwrap();
        assert_eq!(json, serde_json::json!(7));
    }
}
