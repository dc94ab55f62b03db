//! # engine_object
//!
//! Identity and lifecycle for every engine object (actors, components,
//! materials).
//!
//! This crate provides:
//!
//! - [`ObjectId`]: lightweight `u64` object identifiers.
//! - [`ObjectIdAllocator`]: monotonically increasing ID allocator.
//! - [`LifecycleRegistry`]: consumer tracking with deferred destruction.
//!   Objects whose last consumer goes away are only *marked* for
//!   destruction; they are destroyed by the next [`LifecycleRegistry::sweep`]
//!   unless something references them again first.
//! - [`LifecycleError`]: lifecycle bookkeeping errors.

pub mod error;
pub mod id;
pub mod lifecycle;

pub use error::LifecycleError;
pub use id::{ObjectId, ObjectIdAllocator};
pub use lifecycle::{LifecycleRegistry, SweepReport};
