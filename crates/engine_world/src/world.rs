//! The [`World`] — entity registry, component store, query cache, change
//! notifier, and system scheduler behind one API.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ World                                                    │
//! │                                                          │
//! │  registry:  EntityId -> {component type names}           │
//! │  store:     type name -> EntityId -> Payload             │
//! │  cache:     QuerySignature -> Rc<[EntityId]>             │
//! │  notifier:  EntityId -> type name -> [listener]          │
//! │  scheduler: [system] in priority order                   │
//! │  reporter:  where handled errors go                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Errors
//!
//! Mutations on dead entities, updates of never-added component types and
//! removals of unknown systems are reported through the world's
//! [`Reporter`] and returned as `Err`, with no state change. Failures inside
//! listeners and systems are caught (errors and panics alike), reported, and
//! do not stop the remaining listeners or systems.
//!
//! ## Re-entrancy
//!
//! Listeners and systems receive `&mut World` and may mutate it. Listeners
//! fire inline, before the mutating call returns, after the store write and
//! the cache eviction, so a listener that queries sees the new state. A
//! listener that writes its own `(entity, component)` is called again,
//! recursively, with the newer payload; bounding that recursion is the
//! listener's job. Calling [`World::update`] from inside a frame is refused
//! with [`WorldError::NestedUpdate`].

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use engine_component::{Component, ComponentStore, EntityId, Payload, QuerySignature};
use tracing::{debug, debug_span, info, trace};

use crate::cache::QueryCache;
use crate::config::WorldConfig;
use crate::error::{WorldError, panic_message};
use crate::notifier::{ChangeNotifier, Unsubscribe};
use crate::registry::EntityRegistry;
use crate::report::{Reporter, TracingReporter};
use crate::scheduler::{Scheduler, System, SystemId, system_fn};
use crate::stats::WorldStats;

/// Entities matched by [`World::query_with_components`] plus copies of the
/// requested components for each of them.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub entities: Rc<[EntityId]>,
    pub components: HashMap<EntityId, HashMap<String, Payload>>,
}

/// The aggregate of all simulation state.
pub struct World {
    config: WorldConfig,
    registry: EntityRegistry,
    store: ComponentStore,
    cache: RefCell<QueryCache>,
    notifier: ChangeNotifier,
    scheduler: Scheduler,
    reporter: Rc<dyn Reporter>,
    /// Number of completed `update` calls.
    frame: u64,
    /// Set while `update` is running its systems.
    updating: bool,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("frame", &self.frame)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// A world with the default configuration, reporting through `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// A world with `config`, reporting through `tracing`.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self::with_reporter(config, TracingReporter)
    }

    /// A world with `config` that sends every handled error to `reporter`.
    #[must_use]
    pub fn with_reporter(config: WorldConfig, reporter: impl Reporter + 'static) -> Self {
        Self {
            cache: RefCell::new(QueryCache::new(&config)),
            config,
            registry: EntityRegistry::new(),
            store: ComponentStore::new(),
            notifier: ChangeNotifier::new(),
            scheduler: Scheduler::new(),
            reporter: Rc::new(reporter),
            frame: 0,
            updating: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Number of completed [`update`](Self::update) calls.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn fail(&self, err: WorldError) -> Result<(), WorldError> {
        self.reporter.report(&err);
        Err(err)
    }

    fn require_alive(&self, id: EntityId) -> Result<(), WorldError> {
        if self.registry.is_alive(id) {
            Ok(())
        } else {
            self.fail(WorldError::EntityNotFound(id))
        }
    }

    // -- Entity lifecycle --

    /// Create an entity with no components.
    ///
    /// Each name in `initial_types` has its storage declared, which makes it
    /// valid for [`update_component`](Self::update_component); no payload is
    /// stored and the entity does not yet match queries for it.
    pub fn create_entity(&mut self, initial_types: &[&str]) -> EntityId {
        let id = self.registry.create();
        for component in initial_types {
            self.store.declare(component);
        }
        self.cache.get_mut().entities_changed();
        debug!(entity = %id, "entity created");
        id
    }

    /// Create an entity and add each `(type, payload)` pair to it.
    pub fn spawn<I, S>(&mut self, components: I) -> EntityId
    where
        I: IntoIterator<Item = (S, Payload)>,
        S: AsRef<str>,
    {
        let id = self.create_entity(&[]);
        for (component, payload) in components {
            self.insert_component(id, component.as_ref(), payload);
        }
        id
    }

    /// Destroy an entity: remove each of its components, forget the id, and
    /// drop every subscription on it.
    ///
    /// # Errors
    ///
    /// [`WorldError::EntityNotFound`] if `id` is not alive.
    pub fn destroy_entity(&mut self, id: EntityId) -> Result<(), WorldError> {
        self.require_alive(id)?;

        let mut components: Vec<String> = self
            .registry
            .components(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        components.sort_unstable();
        for component in &components {
            self.detach_component(id, component);
        }

        self.registry.destroy(id);
        self.store.remove_entity(id);
        self.notifier.remove_entity(id);
        self.cache.get_mut().entities_changed();
        debug!(entity = %id, components = components.len(), "entity destroyed");
        Ok(())
    }

    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.registry.is_alive(id)
    }

    /// `true` iff `id` is alive and has `component` attached.
    #[must_use]
    pub fn has_component(&self, id: EntityId, component: &str) -> bool {
        self.registry.has(id, component)
    }

    /// All live entities, ascending.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        self.registry.ids()
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    /// Sorted component type names attached to a live entity.
    #[must_use]
    pub fn entity_components(&self, id: EntityId) -> Option<Vec<String>> {
        self.registry.components(id).map(|set| {
            let mut names: Vec<String> = set.iter().cloned().collect();
            names.sort_unstable();
            names
        })
    }

    // -- Component operations --

    /// Attach `payload` as `component` on `id`, replacing any previous value,
    /// then notify listeners of `(id, component)`.
    ///
    /// # Errors
    ///
    /// [`WorldError::EntityNotFound`] if `id` is not alive.
    pub fn add_component(
        &mut self,
        id: EntityId,
        component: &str,
        payload: Payload,
    ) -> Result<(), WorldError> {
        self.require_alive(id)?;
        self.insert_component(id, component, payload);
        Ok(())
    }

    fn insert_component(&mut self, id: EntityId, component: &str, payload: Payload) {
        let notification = self
            .notifier
            .has_listeners(id, component)
            .then(|| payload.clone());

        self.store.insert(id, component, payload);
        if self.registry.attach(id, component) {
            self.cache.get_mut().component_changed(component);
        }
        trace!(entity = %id, component, "component set");

        if let Some(payload) = notification {
            self.notify(id, component, &payload);
        }
    }

    /// Detach `component` from `id` and drop its listeners. Removing a
    /// component the entity does not have is a no-op.
    ///
    /// # Errors
    ///
    /// [`WorldError::EntityNotFound`] if `id` is not alive.
    pub fn remove_component(&mut self, id: EntityId, component: &str) -> Result<(), WorldError> {
        self.require_alive(id)?;
        self.detach_component(id, component);
        Ok(())
    }

    fn detach_component(&mut self, id: EntityId, component: &str) {
        let attached = self.registry.detach(id, component);
        self.store.remove(id, component);
        self.notifier.remove_component(id, component);
        if attached {
            self.cache.get_mut().component_changed(component);
            trace!(entity = %id, component, "component removed");
        }
    }

    /// Borrow the stored payload for `(id, component)`.
    ///
    /// This does not check liveness, and `Some` does not imply that
    /// [`has_component`](Self::has_component) is `true`: see
    /// [`update_component`](Self::update_component).
    #[must_use]
    pub fn get_component(&self, id: EntityId, component: &str) -> Option<&Payload> {
        self.store.get(id, component)
    }

    /// Overwrite the payload for `(id, component)` and notify listeners.
    ///
    /// Only requires that *some* entity has been given `component` before (or
    /// that it was declared by [`create_entity`](Self::create_entity)). The
    /// entity's component set is left alone, so writing a component the
    /// entity was never given stores the payload without making the entity
    /// match queries for it.
    ///
    /// # Errors
    ///
    /// [`WorldError::EntityNotFound`] if `id` is not alive,
    /// [`WorldError::UnknownComponentType`] if `component` was never declared.
    pub fn update_component(
        &mut self,
        id: EntityId,
        component: &str,
        payload: Payload,
    ) -> Result<(), WorldError> {
        self.require_alive(id)?;
        let notification = self
            .notifier
            .has_listeners(id, component)
            .then(|| payload.clone());

        if self.store.replace(id, component, payload).is_err() {
            return self.fail(WorldError::UnknownComponentType {
                entity: id,
                component: component.to_string(),
            });
        }
        trace!(entity = %id, component, "component updated");

        if let Some(payload) = notification {
            self.notify(id, component, &payload);
        }
        Ok(())
    }

    // -- Typed access --

    fn encode<T: Component>(&self, id: EntityId, value: &T) -> Result<Payload, WorldError> {
        value.to_payload().map_err(|source| {
            let err = WorldError::Payload { entity: id, source };
            self.reporter.report(&err);
            err
        })
    }

    /// [`add_component`](Self::add_component) under `T::type_name()`.
    ///
    /// # Errors
    ///
    /// As `add_component`, plus [`WorldError::Payload`] if `value` cannot be
    /// encoded.
    pub fn insert_typed<T: Component>(&mut self, id: EntityId, value: &T) -> Result<(), WorldError> {
        self.require_alive(id)?;
        let payload = self.encode(id, value)?;
        self.add_component(id, T::type_name(), payload)
    }

    /// [`update_component`](Self::update_component) under `T::type_name()`.
    ///
    /// # Errors
    ///
    /// As `update_component`, plus [`WorldError::Payload`] if `value` cannot
    /// be encoded.
    pub fn update_typed<T: Component>(&mut self, id: EntityId, value: &T) -> Result<(), WorldError> {
        self.require_alive(id)?;
        let payload = self.encode(id, value)?;
        self.update_component(id, T::type_name(), payload)
    }

    /// Decode the payload stored under `T::type_name()`.
    ///
    /// # Errors
    ///
    /// [`WorldError::Payload`] if a payload exists but does not fit `T`.
    pub fn get_typed<T: Component>(&self, id: EntityId) -> Result<Option<T>, WorldError> {
        let Some(payload) = self.store.get(id, T::type_name()) else {
            return Ok(None);
        };
        T::from_payload(payload).map(Some).map_err(|source| {
            let err = WorldError::Payload { entity: id, source };
            self.reporter.report(&err);
            err
        })
    }

    // -- Query --

    /// Live entities that have every component in `types`, ascending.
    ///
    /// Order and duplicates in `types` do not matter; an empty list matches
    /// every live entity. Results are shared with the cache and immutable.
    pub fn query<S: AsRef<str>>(&self, types: &[S]) -> Rc<[EntityId]> {
        self.query_signature(QuerySignature::from_names(types))
    }

    /// [`query`](Self::query) with an already canonical signature.
    pub fn query_signature(&self, signature: QuerySignature) -> Rc<[EntityId]> {
        self.cache
            .borrow_mut()
            .get_or_insert_with(signature, |sig| self.registry.matching(sig))
    }

    /// [`query`](Self::query) plus a copy of each requested component for
    /// every matched entity.
    pub fn query_with_components<S: AsRef<str>>(&self, types: &[S]) -> QueryResult {
        let signature = QuerySignature::from_names(types);
        let entities = self.query_signature(signature.clone());
        let components = entities
            .iter()
            .map(|&id| {
                let row = signature
                    .required()
                    .filter_map(|c| self.store.get(id, c).map(|p| (c.to_string(), p.clone())))
                    .collect();
                (id, row)
            })
            .collect();
        QueryResult {
            entities,
            components,
        }
    }

    // -- Change notification --

    /// Call `listener` with the new payload whenever `(id, component)` is
    /// written by `add_component` or `update_component`.
    ///
    /// Listeners for the same pair run in registration order. The
    /// subscription ends when the handle's `unsubscribe` is called, when the
    /// component is removed, or when the entity is destroyed. Subscribing to
    /// a dead entity is reported and returns a handle that does nothing.
    pub fn subscribe<F>(&mut self, id: EntityId, component: &str, listener: F) -> Unsubscribe
    where
        F: Fn(&mut World, EntityId, &Payload) -> anyhow::Result<()> + 'static,
    {
        if self.require_alive(id).is_err() {
            return Unsubscribe::inert(id, component);
        }
        self.notifier.subscribe(id, component, Rc::new(listener))
    }

    fn notify(&mut self, id: EntityId, component: &str, payload: &Payload) {
        for (key, listener) in self.notifier.snapshot(id, component) {
            if !self.notifier.is_active(id, component, key) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| (*listener)(self, id, payload)));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => format!("{err:#}"),
                Err(panic) => panic_message(panic.as_ref()),
            };
            self.reporter.report(&WorldError::ListenerFailed {
                entity: id,
                component: component.to_string(),
                message,
            });
        }
    }

    // -- Systems --

    /// Register a system. Lower `priority` runs earlier; `None` means
    /// [`DEFAULT_PRIORITY`](crate::DEFAULT_PRIORITY); equal priorities keep
    /// registration order.
    pub fn add_system(&mut self, system: impl System + 'static, priority: Option<i32>) -> SystemId {
        let id = self.scheduler.add(Box::new(system), priority);
        debug!(system = %id, order = ?self.scheduler.names(), "system added");
        id
    }

    /// Register a closure as a system with default priority.
    pub fn add_system_fn<F>(&mut self, name: impl Into<String>, f: F) -> SystemId
    where
        F: FnMut(&mut World, f64) -> anyhow::Result<()> + 'static,
    {
        self.add_system(system_fn(name, f), None)
    }

    /// Unregister a system. Takes effect immediately, including for the rest
    /// of a frame in progress.
    ///
    /// # Errors
    ///
    /// [`WorldError::SystemNotFound`] if `id` is not registered.
    pub fn remove_system(&mut self, id: SystemId) -> Result<(), WorldError> {
        if self.scheduler.remove(id) {
            debug!(system = %id, "system removed");
            Ok(())
        } else {
            self.fail(WorldError::SystemNotFound(id))
        }
    }

    /// System names in execution order.
    #[must_use]
    pub fn system_names(&self) -> Vec<String> {
        self.scheduler.names()
    }

    /// Run every registered system once, in order, with `dt`.
    ///
    /// The frame's system list is fixed when the call starts: systems added
    /// during the frame first run on the next one, systems removed during the
    /// frame are skipped if they have not run yet. A call made while a frame
    /// is running (from a system or a listener it triggered) is reported as
    /// [`WorldError::NestedUpdate`] and does nothing.
    pub fn update(&mut self, dt: f64) {
        if self.updating {
            self.reporter.report(&WorldError::NestedUpdate { frame: self.frame });
            return;
        }
        let _span = debug_span!("world_update", frame = self.frame, dt).entered();
        self.updating = true;

        for scheduled in self.scheduler.frame() {
            if !self.scheduler.contains(scheduled.id) {
                continue;
            }
            let mut system = scheduled.system.borrow_mut();
            let outcome = catch_unwind(AssertUnwindSafe(|| system.run(self, dt)));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => format!("{err:#}"),
                Err(panic) => panic_message(panic.as_ref()),
            };
            self.reporter.report(&WorldError::SystemFailed {
                name: scheduled.name,
                message,
            });
        }

        self.updating = false;
        self.frame += 1;
    }

    // -- Whole-world --

    /// Drop every entity, payload, declared type, cached query, subscription
    /// and system. Entity ids handed out before stay retired.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.store.clear();
        self.cache.get_mut().clear();
        self.notifier.clear();
        self.scheduler.clear();
        info!("world cleared");
    }

    /// Counts for debug tooling.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        let cache = self.cache.borrow();
        let (cache_hits, cache_misses) = cache.counters();
        WorldStats {
            entities: self.registry.len(),
            components: self.store.len(),
            systems: self.scheduler.len(),
            component_types: self.store.type_names(),
            subscriptions: self.notifier.len(),
            cached_queries: cache.len(),
            cache_hits,
            cache_misses,
        }
    }

    /// Declared component type names.
    #[must_use]
    pub fn component_types(&self) -> BTreeSet<String> {
        self.store.type_names()
    }
}
