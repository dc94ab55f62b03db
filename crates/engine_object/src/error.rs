//! Lifecycle error types.

use crate::id::ObjectId;

/// Errors raised by the [`LifecycleRegistry`](crate::LifecycleRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The object was never registered.
    #[error("{0} is not registered")]
    UnknownObject(ObjectId),

    /// An object tried to hold a reference to itself.
    #[error("{0} cannot consume itself")]
    SelfReference(ObjectId),

    /// A destroyed object was referenced again.
    #[error("{0} was used after it was destroyed")]
    UseAfterDestroy(ObjectId),

    /// A sweep found an object that had already been destroyed.
    #[error("{0} was destroyed twice")]
    AlreadyDestroyed(ObjectId),
}

impl LifecycleError {
    /// Returns `true` for errors that can only come from a bookkeeping bug.
    ///
    /// These are not recoverable: the caller should shut the affected
    /// subsystem down rather than carry on with a corrupt object graph.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::UseAfterDestroy(_) | Self::AlreadyDestroyed(_))
    }
}
