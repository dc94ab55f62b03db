//! Scene error types.

use engine_object::LifecycleError;

use crate::ids::{ActorId, ComponentId, MaterialId};

/// Errors returned by structural scene operations.
///
/// Every structural error is reported before anything is modified, so a
/// failed call leaves the scene exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The actor does not exist (never spawned, or already swept).
    #[error("{0} not found")]
    ActorNotFound(ActorId),

    /// The component does not exist (never created, or already swept).
    #[error("{0} not found")]
    ComponentNotFound(ComponentId),

    /// The material does not exist (never created, or already swept).
    #[error("{0} not found")]
    MaterialNotFound(MaterialId),

    /// The component already belongs to an actor.
    #[error("{component} is already owned by {owner}")]
    AlreadyOwned {
        /// The component being attached.
        component: ComponentId,
        /// Its current owner.
        owner: ActorId,
    },

    /// The component already has a parent; remove it first.
    #[error("{component} already has parent {parent}")]
    AlreadyParented {
        /// The component being re-parented.
        component: ComponentId,
        /// Its current parent.
        parent: ComponentId,
    },

    /// The child is the parent itself or one of its ancestors.
    #[error("adding {child} under {parent} would create a cycle")]
    WouldCreateCycle {
        /// The requested parent.
        parent: ComponentId,
        /// The requested child.
        child: ComponentId,
    },

    /// The component is not attached directly to the actor.
    #[error("{component} is not attached to {actor}")]
    NotAttached {
        /// The actor named in the call.
        actor: ActorId,
        /// The component named in the call.
        component: ComponentId,
    },

    /// The child is not a child of the given parent.
    #[error("{child} is not a child of {parent}")]
    NotAChild {
        /// The parent named in the call.
        parent: ComponentId,
        /// The child named in the call.
        child: ComponentId,
    },

    /// The operation needs a component with spatial placement.
    #[error("{0} is not a scene component")]
    NotSpatial(ComponentId),

    /// The operation needs a renderable component.
    #[error("{0} is not renderable")]
    NotRenderable(ComponentId),

    /// Lifecycle bookkeeping rejected the operation.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl SceneError {
    /// Returns `true` if this error means the object graph is corrupt.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Lifecycle(e) if e.is_invariant_violation())
    }
}
