//! # engine_math
//!
//! Math types for the scene core. Re-exports [`glam`] for linear algebra and
//! defines the spatial types the scene hierarchy is built from:
//!
//! - [`Transform`]: a node's relative scale/rotation/translation plus the
//!   per-channel absolute overrides.
//! - [`WorldTransform`]: the composed, world-space result.
//! - [`Aabb`]: axis-aligned bounding boxes.

pub mod bounds;
pub mod transform;

// Re-export glam types for convenience.
pub use glam::{Mat4, Quat, Vec3, Vec4};

pub use bounds::Aabb;
pub use transform::{AbsoluteChannels, Transform, WorldTransform};
