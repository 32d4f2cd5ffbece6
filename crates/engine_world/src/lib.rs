//! # engine_world
//!
//! The ECS world: single-threaded, synchronous owner of all simulation state.
//!
//! This crate provides:
//!
//! - [`World`] — entity lifecycle, string-keyed component storage, cached
//!   shape queries, change subscriptions, and the per-frame system loop.
//! - [`System`] / [`system_fn`] — per-frame update steps.
//! - [`Reporter`] — where the world sends errors it handled itself.
//! - [`WorldConfig`] — query caching and invalidation settings.
//!
//! ## Usage
//!
//! ```rust
//! use engine_world::World;
//! use serde_json::json;
//!
//! let mut world = World::new();
//! let e = world.create_entity(&[]);
//! world.add_component(e, "Position", json!({"x": 100, "y": 200})).unwrap();
//! world.add_component(e, "Health", json!({"current": 75, "max": 100})).unwrap();
//!
//! assert_eq!(world.query(&["Health", "Position"]).as_ref(), [e]);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod notifier;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod stats;
pub mod world;

pub use config::{InvalidationPolicy, WorldConfig};
pub use error::{Severity, WorldError};
pub use notifier::{Listener, Unsubscribe};
pub use report::{Diagnostic, MemoryReporter, Reporter, TracingReporter};
pub use scheduler::{DEFAULT_PRIORITY, FnSystem, System, SystemId, system_fn};
pub use stats::WorldStats;
pub use world::{QueryResult, World};

pub use engine_component::{Component, EntityId, Payload, QuerySignature};
