//! Object identifiers and allocation.
//!
//! An [`ObjectId`] is a lightweight `u64` identifier. IDs are handed out by
//! an [`ObjectIdAllocator`] in strictly increasing order and are never
//! reused, so a stale ID can always be told apart from a live one.

use serde::{Deserialize, Serialize};

/// A unique engine object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// The consumer that holds objects owned directly by the world (spawned
    /// actors). It is never allocated and never destroyed.
    pub const SCENE_ROOT: ObjectId = ObjectId(0);

    /// Create an object ID from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is the reserved scene-root ID.
    #[must_use]
    pub const fn is_scene_root(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Object({})", self.0)
    }
}

/// Allocates monotonically increasing object IDs.
#[derive(Debug)]
pub struct ObjectIdAllocator {
    next_id: u64,
}

impl ObjectIdAllocator {
    /// Creates a new allocator. IDs start at 1 (0 is reserved for
    /// [`ObjectId::SCENE_ROOT`]).
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Allocates a fresh object ID.
    pub fn allocate(&mut self) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        ObjectId(id)
    }

    /// Returns the number of IDs allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }
}

impl Default for ObjectIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
