//! Typed handles over [`ObjectId`].
//!
//! Every scene object is an engine object with an [`ObjectId`]; the typed
//! wrappers stop an actor ID from being passed where a component ID is
//! expected.

use engine_object::ObjectId;
use serde::{Deserialize, Serialize};

macro_rules! object_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub ObjectId);

        impl $name {
            /// Returns the underlying engine object ID.
            #[must_use]
            pub const fn object(self) -> ObjectId {
                self.0
            }
        }

        impl From<$name> for ObjectId {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, "({})"), self.0.id())
            }
        }
    };
}

object_handle!(
    /// Handle to an [`Actor`](crate::Actor).
    ActorId,
    "Actor"
);

object_handle!(
    /// Handle to a [`Component`](crate::Component).
    ComponentId,
    "Component"
);

object_handle!(
    /// Handle to a [`Material`](crate::Material).
    MaterialId,
    "Material"
);

/// Identifies the renderer-side proxy mirroring a renderable component.
///
/// A proxy's ID is derived from the component it mirrors, so the two can be
/// matched without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProxyId(pub u64);

impl ProxyId {
    /// The proxy ID for a component.
    #[must_use]
    pub const fn for_component(component: ComponentId) -> Self {
        Self(component.0.id())
    }
}

impl std::fmt::Display for ProxyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Proxy({})", self.0)
    }
}
