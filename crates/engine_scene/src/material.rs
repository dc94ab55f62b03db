//! Shared materials.
//!
//! Materials are engine objects in their own right: several mesh components
//! can hold the same material, each holding a counted reference. A material
//! is swept once the last mesh lets go of it.

use glam::Vec4;

use crate::ids::MaterialId;

/// A surface description shared between mesh components.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub(crate) id: MaterialId,
    pub(crate) name: String,
    /// Linear RGBA base colour.
    pub base_color: Vec4,
}

impl Material {
    /// Returns the material's handle.
    #[must_use]
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Returns the material's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
