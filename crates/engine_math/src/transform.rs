//! Hierarchical transforms.
//!
//! A [`Transform`] is the placement of a scene node *relative to its parent*.
//! Composing the transforms of an ancestor chain (root first) yields a
//! [`WorldTransform`].
//!
//! Composition is done per channel rather than by multiplying matrices, so
//! each channel can be cut loose from the hierarchy independently. When a
//! node marks a channel as absolute, that channel is taken verbatim from the
//! node and nothing above it contributes to it.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Which channels of a [`Transform`] ignore all ancestor contribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsoluteChannels {
    /// Scale is world-space, not multiplied by the parent's scale.
    pub scale: bool,
    /// Rotation is world-space, not composed with the parent's rotation.
    pub rotation: bool,
    /// Translation is a world-space position.
    pub translation: bool,
}

impl AbsoluteChannels {
    /// All channels relative to the parent.
    pub const NONE: Self = Self {
        scale: false,
        rotation: false,
        translation: false,
    };

    /// Returns `true` if at least one channel is absolute.
    #[must_use]
    pub const fn any(self) -> bool {
        self.scale || self.rotation || self.translation
    }
}

/// A node's relative transform: scale, rotation and translation expressed in
/// the parent's space, plus per-channel absolute overrides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Offset from the parent.
    pub translation: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Per-axis scale factor.
    pub scale: Vec3,
    /// Channels that bypass the hierarchy.
    pub absolute: AbsoluteChannels,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale, all channels
    /// relative.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        absolute: AbsoluteChannels::NONE,
    };

    /// Create a transform with the given translation and default
    /// rotation/scale.
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Create a transform from all three channels.
    #[must_use]
    pub fn from_scale_rotation_translation(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
            absolute: AbsoluteChannels::NONE,
        }
    }

    /// Compute the 4×4 matrix of this transform on its own, ignoring any
    /// hierarchy.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Mark the translation channel as absolute.
    #[must_use]
    pub fn with_absolute_translation(mut self, absolute: bool) -> Self {
        self.absolute.translation = absolute;
        self
    }

    /// Mark the rotation channel as absolute.
    #[must_use]
    pub fn with_absolute_rotation(mut self, absolute: bool) -> Self {
        self.absolute.rotation = absolute;
        self
    }

    /// Mark the scale channel as absolute.
    #[must_use]
    pub fn with_absolute_scale(mut self, absolute: bool) -> Self {
        self.absolute.scale = absolute;
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A fully composed world-space transform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorldTransform {
    /// World-space position.
    pub translation: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    /// World-space scale.
    pub scale: Vec3,
}

impl WorldTransform {
    /// The world origin.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Place `child` under `self`.
    ///
    /// Each channel marked absolute on `child` is copied from it unchanged.
    #[must_use]
    pub fn then(&self, child: &Transform) -> Self {
        let scale = if child.absolute.scale {
            child.scale
        } else {
            self.scale * child.scale
        };
        let rotation = if child.absolute.rotation {
            child.rotation
        } else {
            self.rotation * child.rotation
        };
        let translation = if child.absolute.translation {
            child.translation
        } else {
            self.translation + self.rotation * (self.scale * child.translation)
        };
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Compose a root-to-leaf chain of relative transforms.
    #[must_use]
    pub fn compose<'a, I>(chain: I) -> Self
    where
        I: IntoIterator<Item = &'a Transform>,
    {
        chain
            .into_iter()
            .fold(Self::IDENTITY, |world, local| world.then(local))
    }

    /// Compute the 4×4 model matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Returns `true` if every channel is within `max_abs_diff` of `other`.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, max_abs_diff)
            && self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
