//! # engine_scene
//!
//! The live scene hierarchy. A [`World`] owns every [`Actor`], [`Component`]
//! and [`Material`] in one arena; all back-references (owner actor, parent,
//! ancestor chain) are stored as IDs resolved through that arena.
//!
//! This crate provides:
//!
//! - [`World`]: the arena plus the structural operations (attach, detach,
//!   add/remove child), transform setters, name lookup and garbage
//!   collection driven by the [`LifecycleRegistry`](engine_object::LifecycleRegistry).
//! - [`ComponentKind`]: the closed set of component kinds, with the
//!   [`HasTransform`] / [`HasMaterials`] capability traits and the
//!   [`ComponentClass`] markers used for typed lookups.
//! - [`propagation`]: the two per-frame dirty propagation passes.
//! - [`SceneError`]: structural and lifecycle errors.
//!
//! The scene is owned and mutated by the update thread only. It never talks
//! to the renderer: proxies are bound and orphaned through IDs that the sync
//! step in `engine_render` consumes.

pub mod actor;
pub mod component;
pub mod error;
pub mod ids;
pub mod material;
pub mod names;
pub mod propagation;
pub mod world;

pub use actor::Actor;
pub use component::{
    AnyComponent, Component, ComponentClass, ComponentKind, DirtyState, GeometryRef,
    HasMaterials, HasTransform, MeshComponent, MeshRenderer, SceneComponent, SceneNode,
};
pub use error::SceneError;
pub use ids::{ActorId, ComponentId, MaterialId, ProxyId};
pub use material::Material;
pub use names::NameIndex;
pub use propagation::{propagate_down, propagate_up};
pub use world::{GarbageReport, World};
