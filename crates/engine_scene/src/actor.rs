//! Actors: top-level scene entities.

use crate::ids::{ActorId, ComponentId};
use crate::names::NameIndex;

/// A top-level scene entity owning an ordered list of components.
///
/// Only components attached directly to the actor are listed in
/// [`Actor::components`]; their scene descendants are reached through the
/// hierarchy but are still registered in the actor's [`NameIndex`].
#[derive(Debug, Clone)]
pub struct Actor {
    pub(crate) id: ActorId,
    pub(crate) name: String,
    pub(crate) components: Vec<ComponentId>,
    /// The first attached scene component, if any. Never has a parent.
    pub(crate) root: Option<ComponentId>,
    pub(crate) names: NameIndex,
}

impl Actor {
    pub(crate) fn new(id: ActorId, name: String) -> Self {
        Self {
            id,
            name,
            components: Vec::new(),
            root: None,
            names: NameIndex::new(),
        }
    }

    /// Returns the actor's handle.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Returns the actor's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the directly attached components in attach order.
    #[must_use]
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    /// Returns the root scene component.
    #[must_use]
    pub fn root_component(&self) -> Option<ComponentId> {
        self.root
    }

    /// Returns the name index covering every component in the actor's tree.
    #[must_use]
    pub fn names(&self) -> &NameIndex {
        &self.names
    }
}
