//! # engine_component
//!
//! The "E" and "C" in ECS — entity identity, component payloads, and the
//! canonical form of a component query.
//!
//! This crate provides:
//!
//! - [`EntityId`] — lightweight `u64` entity identifiers.
//! - [`EntityAllocator`] — monotonically increasing, never-reused ids.
//! - [`Component`] trait — typed access to string-named [`Payload`]s.
//! - [`ComponentStore`] — per-type `entity -> payload` columns.
//! - [`QuerySignature`] — order-independent query cache key.

pub mod component;
pub mod entity;
pub mod query;
pub mod storage;

pub use component::{Component, Payload, PayloadError};
pub use entity::{EntityAllocator, EntityId};
pub use query::QuerySignature;
pub use storage::{Column, ComponentStore};
