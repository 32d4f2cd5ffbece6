//! Change notifier — per-entity, per-component subscriptions.
//!
//! Subscriptions are stored as `entity -> component -> [listener]` so that
//! destroying an entity drops all of its listeners in one step. The map sits
//! behind `Rc<RefCell<..>>`; each [`Unsubscribe`] handle holds a `Weak` to it
//! and can remove its own registration without access to the world.
//!
//! The notifier only stores listeners. Invoking them needs `&mut World`, so
//! dispatch lives in [`World`](crate::World): it takes a [`snapshot`] of the
//! listeners for a change, releases the map, and then calls each one that is
//! still [`is_active`].
//!
//! [`snapshot`]: ChangeNotifier::snapshot
//! [`is_active`]: ChangeNotifier::is_active

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use engine_component::{EntityId, Payload};

use crate::world::World;

/// A change callback. Receives the world, the entity, and the new payload.
///
/// Listeners may write back into the world, including to the pair they
/// watch, so the same listener can be running more than once at a time.
/// State they carry lives in `Cell`/`RefCell`.
pub type Listener = Rc<dyn Fn(&mut World, EntityId, &Payload) -> anyhow::Result<()>>;

struct Subscription {
    key: u64,
    listener: Listener,
}

#[derive(Default)]
struct SubscriberMap {
    next_key: u64,
    by_entity: HashMap<EntityId, HashMap<String, Vec<Subscription>>>,
}

impl SubscriberMap {
    fn remove(&mut self, entity: EntityId, component: &str, key: u64) -> bool {
        let Some(by_component) = self.by_entity.get_mut(&entity) else {
            return false;
        };
        let Some(subs) = by_component.get_mut(component) else {
            return false;
        };
        let Some(pos) = subs.iter().position(|s| s.key == key) else {
            return false;
        };
        subs.remove(pos);
        if subs.is_empty() {
            by_component.remove(component);
        }
        if by_component.is_empty() {
            self.by_entity.remove(&entity);
        }
        true
    }
}

/// Owner of every subscription in a world.
#[derive(Default)]
pub struct ChangeNotifier {
    map: Rc<RefCell<SubscriberMap>>,
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscriptions", &self.len())
            .finish()
    }
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for changes to `(entity, component)`.
    pub fn subscribe(&self, entity: EntityId, component: &str, listener: Listener) -> Unsubscribe {
        let mut map = self.map.borrow_mut();
        let key = map.next_key;
        map.next_key += 1;
        map.by_entity
            .entry(entity)
            .or_default()
            .entry(component.to_string())
            .or_default()
            .push(Subscription {
                key,
                listener,
            });
        Unsubscribe {
            map: Rc::downgrade(&self.map),
            entity,
            component: component.to_string(),
            key,
        }
    }

    /// Returns `true` if anything listens to `(entity, component)`.
    #[must_use]
    pub fn has_listeners(&self, entity: EntityId, component: &str) -> bool {
        self.map
            .borrow()
            .by_entity
            .get(&entity)
            .is_some_and(|by_component| by_component.contains_key(component))
    }

    /// The listeners for `(entity, component)` in registration order, with
    /// their keys. The map is not borrowed once this returns.
    #[must_use]
    pub fn snapshot(&self, entity: EntityId, component: &str) -> Vec<(u64, Listener)> {
        self.map
            .borrow()
            .by_entity
            .get(&entity)
            .and_then(|by_component| by_component.get(component))
            .map(|subs| {
                subs.iter()
                    .map(|s| (s.key, Rc::clone(&s.listener)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns `true` if the registration `key` still exists.
    #[must_use]
    pub fn is_active(&self, entity: EntityId, component: &str, key: u64) -> bool {
        self.map
            .borrow()
            .by_entity
            .get(&entity)
            .and_then(|by_component| by_component.get(component))
            .is_some_and(|subs| subs.iter().any(|s| s.key == key))
    }

    /// Drop every listener on `(entity, component)`.
    pub fn remove_component(&self, entity: EntityId, component: &str) {
        let mut map = self.map.borrow_mut();
        if let Some(by_component) = map.by_entity.get_mut(&entity) {
            by_component.remove(component);
            if by_component.is_empty() {
                map.by_entity.remove(&entity);
            }
        }
    }

    /// Drop every listener on `entity`. Returns how many were removed.
    pub fn remove_entity(&self, entity: EntityId) -> usize {
        self.map
            .borrow_mut()
            .by_entity
            .remove(&entity)
            .map(|by_component| by_component.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Total number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map
            .borrow()
            .by_entity
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.borrow().by_entity.is_empty()
    }

    /// Drop every subscription. Outstanding handles become no-ops.
    pub fn clear(&self) {
        self.map.borrow_mut().by_entity.clear();
    }
}

/// Capability to remove one subscription.
///
/// Dropping the handle does **not** unsubscribe. Calling
/// [`unsubscribe`](Self::unsubscribe) more than once, after the component or
/// entity is gone, or after the world itself was dropped, does nothing.
#[derive(Debug, Clone)]
pub struct Unsubscribe {
    map: Weak<RefCell<SubscriberMap>>,
    entity: EntityId,
    component: String,
    key: u64,
}

impl Unsubscribe {
    /// A handle that refers to no subscription.
    pub(crate) fn inert(entity: EntityId, component: &str) -> Self {
        Self {
            map: Weak::new(),
            entity,
            component: component.to_string(),
            key: u64::MAX,
        }
    }

    /// Remove the subscription. Returns `true` only on the call that removed it.
    pub fn unsubscribe(&self) -> bool {
        match self.map.upgrade() {
            Some(map) => map
                .borrow_mut()
                .remove(self.entity, &self.component, self.key),
            None => false,
        }
    }

    /// The entity this handle's subscription watches.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// The component type this handle's subscription watches.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Listener {
        Rc::new(|_: &mut World, _: EntityId, _: &Payload| Ok(()))
    }

    #[test]
    fn test_snapshot_in_registration_order() {
        let notifier = ChangeNotifier::new();
        let e = EntityId(0);
        let first = notifier.subscribe(e, "Position", noop());
        let second = notifier.subscribe(e, "Position", noop());
        notifier.subscribe(e, "Health", noop());

        let keys: Vec<u64> = notifier.snapshot(e, "Position").iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![first.key, second.key]);
        assert_eq!(notifier.len(), 3);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let notifier = ChangeNotifier::new();
        let e = EntityId(1);
        let handle = notifier.subscribe(e, "Position", noop());
        let other = notifier.subscribe(e, "Position", noop());

        assert!(handle.unsubscribe());
        assert!(!handle.unsubscribe());
        assert!(!notifier.is_active(e, "Position", handle.key));
        assert!(notifier.is_active(e, "Position", other.key));
        assert_eq!(notifier.len(), 1);
    }

    #[test]
    fn test_remove_entity_purges_all_components() {
        let notifier = ChangeNotifier::new();
        let e = EntityId(2);
        notifier.subscribe(e, "A", noop());
        notifier.subscribe(e, "B", noop());
        notifier.subscribe(EntityId(3), "A", noop());

        assert_eq!(notifier.remove_entity(e), 2);
        assert!(!notifier.has_listeners(e, "A"));
        assert!(notifier.has_listeners(EntityId(3), "A"));
    }

    #[test]
    fn test_handle_outlives_notifier() {
        let handle = {
            let notifier = ChangeNotifier::new();
            notifier.subscribe(EntityId(0), "A", noop())
        };
        assert!(!handle.unsubscribe());
        assert!(!Unsubscribe::inert(EntityId(0), "A").unsubscribe());
    }

    #[test]
    fn test_remove_component_prunes_empty_entity() {
        let notifier = ChangeNotifier::new();
        let e = EntityId(5);
        let handle = notifier.subscribe(e, "A", noop());
        notifier.remove_component(e, "A");
        assert!(notifier.is_empty());
        assert!(!handle.unsubscribe());
    }
}
