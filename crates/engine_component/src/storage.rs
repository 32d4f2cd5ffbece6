//! String-keyed component storage.
//!
//! [`ComponentStore`] maps each component type name to a column of
//! `entity -> payload`. It is pure storage: it knows nothing about entity
//! liveness, queries, or notifications. The world layers those on top.

use std::collections::{BTreeSet, HashMap};

use crate::component::Payload;
use crate::entity::EntityId;

/// One component type's payloads, keyed by entity.
pub type Column = HashMap<EntityId, Payload>;

/// Per-type payload columns.
///
/// A type is *declared* once its column exists, even if the column is empty.
/// Columns are never dropped individually, only emptied; [`clear`](Self::clear)
/// forgets everything.
#[derive(Debug, Default)]
pub struct ComponentStore {
    columns: HashMap<String, Column>,
}

impl ComponentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a column exists for `component`.
    ///
    /// Returns `true` if the column was newly created.
    pub fn declare(&mut self, component: &str) -> bool {
        if self.columns.contains_key(component) {
            return false;
        }
        self.columns.insert(component.to_string(), Column::new());
        true
    }

    /// Returns `true` if `component` has a column.
    #[must_use]
    pub fn is_declared(&self, component: &str) -> bool {
        self.columns.contains_key(component)
    }

    /// Store `payload` for `(entity, component)`, declaring the column if
    /// needed. Returns the payload it replaced, if any.
    pub fn insert(&mut self, entity: EntityId, component: &str, payload: Payload) -> Option<Payload> {
        match self.columns.get_mut(component) {
            Some(column) => column.insert(entity, payload),
            None => {
                let mut column = Column::new();
                column.insert(entity, payload);
                self.columns.insert(component.to_string(), column);
                None
            }
        }
    }

    /// Overwrite `(entity, component)` in an already declared column.
    ///
    /// Gives the payload back as `Err` when the column does not exist, so the
    /// caller decides how to report it.
    pub fn replace(
        &mut self,
        entity: EntityId,
        component: &str,
        payload: Payload,
    ) -> Result<Option<Payload>, Payload> {
        match self.columns.get_mut(component) {
            Some(column) => Ok(column.insert(entity, payload)),
            None => Err(payload),
        }
    }

    /// Borrow the payload for `(entity, component)`.
    #[must_use]
    pub fn get(&self, entity: EntityId, component: &str) -> Option<&Payload> {
        self.columns.get(component)?.get(&entity)
    }

    /// Remove and return the payload for `(entity, component)`.
    pub fn remove(&mut self, entity: EntityId, component: &str) -> Option<Payload> {
        self.columns.get_mut(component)?.remove(&entity)
    }

    /// Remove every payload stored for `entity`, in any column. Returns how
    /// many were removed.
    pub fn remove_entity(&mut self, entity: EntityId) -> usize {
        self.columns
            .values_mut()
            .filter_map(|column| column.remove(&entity))
            .count()
    }

    /// Borrow a whole column.
    #[must_use]
    pub fn column(&self, component: &str) -> Option<&Column> {
        self.columns.get(component)
    }

    /// Total number of stored payloads across all columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.values().map(HashMap::len).sum()
    }

    /// Returns `true` if no payloads are stored (declared columns may exist).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.values().all(HashMap::is_empty)
    }

    /// All declared type names, sorted.
    #[must_use]
    pub fn type_names(&self) -> BTreeSet<String> {
        self.columns.keys().cloned().collect()
    }

    /// Drop every column and payload.
    pub fn clear(&mut self) {
        self.columns.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_insert_declares_and_overwrites() {
        let mut store = ComponentStore::new();
        let e = EntityId(0);
        assert!(store.insert(e, "Position", json!({"x": 1})).is_none());
        assert!(store.is_declared("Position"));

        let old = store.insert(e, "Position", json!({"x": 2}));
        assert_eq!(old, Some(json!({"x": 1})));
        assert_eq!(store.get(e, "Position"), Some(&json!({"x": 2})));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_replace_requires_declared_column() {
        let mut store = ComponentStore::new();
        let e = EntityId(3);

        let rejected = store.replace(e, "Health", json!(5));
        assert_eq!(rejected, Err(json!(5)));
        assert!(!store.is_declared("Health"));

        assert!(store.declare("Health"));
        assert!(!store.declare("Health"));
        // Declared column, no entry yet for this entity: replace still writes.
        assert_eq!(store.replace(e, "Health", json!(5)), Ok(None));
        assert_eq!(store.get(e, "Health"), Some(&json!(5)));
    }

    #[test]
    fn test_remove_keeps_column_declared() {
        let mut store = ComponentStore::new();
        let e = EntityId(1);
        store.insert(e, "Velocity", json!([0, 1]));

        assert_eq!(store.remove(e, "Velocity"), Some(json!([0, 1])));
        assert_eq!(store.remove(e, "Velocity"), None);
        assert!(store.is_declared("Velocity"));
        assert!(store.is_empty());
        assert_eq!(store.type_names().into_iter().collect::<Vec<_>>(), ["Velocity"]);
    }

    #[test]
    fn test_remove_entity_sweeps_every_column() {
        let mut store = ComponentStore::new();
        let e = EntityId(2);
        store.insert(e, "A", json!(1));
        store.insert(e, "B", json!(2));
        store.insert(EntityId(9), "A", json!(3));

        assert_eq!(store.remove_entity(e), 2);
        assert_eq!(store.get(e, "A"), None);
        assert_eq!(store.get(EntityId(9), "A"), Some(&json!(3)));
    }

    #[test]
    fn test_clear_forgets_types() {
        let mut store = ComponentStore::new();
        store.insert(EntityId(0), "A", json!(null));
        store.declare("B");
        store.clear();
        assert!(store.type_names().is_empty());
        assert_eq!(store.len(), 0);
    }
}
