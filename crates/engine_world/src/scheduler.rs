//! System scheduler — ordered per-frame callables.
//!
//! Systems run one after another on the calling thread, in priority order.
//! Lower priority values run first; systems with equal priority run in the
//! order they were added. Registration without a priority uses
//! [`DEFAULT_PRIORITY`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::world::World;

/// Priority given to systems registered without one.
pub const DEFAULT_PRIORITY: i32 = 0;

/// A per-frame update step.
pub trait System {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Advance by `dt` seconds.
    ///
    /// # Errors
    ///
    /// An error is reported by the world and does not stop the frame.
    fn run(&mut self, world: &mut World, dt: f64) -> anyhow::Result<()>;
}

/// A [`System`] backed by a closure. Build one with [`system_fn`].
pub struct FnSystem<F> {
    name: String,
    f: F,
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut World, f64) -> anyhow::Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, world: &mut World, dt: f64) -> anyhow::Result<()> {
        (self.f)(world, dt)
    }
}

/// Wrap a closure as a named system.
pub fn system_fn<F>(name: impl Into<String>, f: F) -> FnSystem<F>
where
    F: FnMut(&mut World, f64) -> anyhow::Result<()>,
{
    FnSystem {
        name: name.into(),
        f,
    }
}

/// Handle identifying a registered system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(u64);

impl std::fmt::Display for SystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "System({})", self.0)
    }
}

/// Shared, individually borrowable system.
pub type SystemCell = Rc<RefCell<Box<dyn System>>>;

/// A system as seen by one frame.
pub struct ScheduledSystem {
    pub id: SystemId,
    pub name: String,
    pub system: SystemCell,
}

struct Entry {
    id: SystemId,
    name: String,
    priority: i32,
    system: SystemCell,
}

/// The ordered system list.
#[derive(Default)]
pub struct Scheduler {
    next_id: u64,
    entries: Vec<Entry>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("systems", &self.names())
            .finish()
    }
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `system` after every entry with priority `<=` its own.
    pub fn add(&mut self, system: Box<dyn System>, priority: Option<i32>) -> SystemId {
        let priority = priority.unwrap_or(DEFAULT_PRIORITY);
        let id = SystemId(self.next_id);
        self.next_id += 1;

        let pos = self
            .entries
            .iter()
            .position(|e| e.priority > priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            pos,
            Entry {
                id,
                name: system.name().to_string(),
                priority,
                system: Rc::new(RefCell::new(system)),
            },
        );
        id
    }

    /// Remove a system. Returns `false` if `id` is not registered.
    pub fn remove(&mut self, id: SystemId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn contains(&self, id: SystemId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// The systems to run this frame, in order.
    #[must_use]
    pub fn frame(&self) -> Vec<ScheduledSystem> {
        self.entries
            .iter()
            .map(|e| ScheduledSystem {
                id: e.id,
                name: e.name.clone(),
                system: Rc::clone(&e.system),
            })
            .collect()
    }

    /// System names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Box<dyn System> {
        Box::new(system_fn(name, |_, _| Ok(())))
    }

    #[test]
    fn test_insertion_order_without_priority() {
        let mut scheduler = Scheduler::new();
        scheduler.add(named("input"), None);
        scheduler.add(named("physics"), None);
        scheduler.add(named("render"), None);
        assert_eq!(scheduler.names(), ["input", "physics", "render"]);
    }

    #[test]
    fn test_priority_is_stable_ascending() {
        let mut scheduler = Scheduler::new();
        scheduler.add(named("late"), Some(10));
        scheduler.add(named("default_a"), None);
        scheduler.add(named("early"), Some(-5));
        scheduler.add(named("default_b"), Some(DEFAULT_PRIORITY));
        scheduler.add(named("late_b"), Some(10));
        assert_eq!(
            scheduler.names(),
            ["early", "default_a", "default_b", "late", "late_b"]
        );
    }

    #[test]
    fn test_remove_by_id() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.add(named("a"), None);
        let b = scheduler.add(named("b"), None);
        assert!(scheduler.remove(a));
        assert!(!scheduler.remove(a));
        assert!(!scheduler.contains(a));
        assert!(scheduler.contains(b));
        assert_eq!(scheduler.names(), ["b"]);
    }

    #[test]
    fn test_frame_snapshot_is_detached() {
        let mut scheduler = Scheduler::new();
        scheduler.add(named("a"), None);
        let frame = scheduler.frame();
        scheduler.clear();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].name, "a");
        assert!(scheduler.is_empty());
    }
}
