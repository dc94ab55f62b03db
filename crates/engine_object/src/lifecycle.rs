//! Lifecycle registry: consumer tracking and deferred destruction.
//!
//! Every engine object is registered here when it is created. Other objects
//! declare that they hold it with [`LifecycleRegistry::add_ref`] and let go
//! with [`LifecycleRegistry::remove_ref`]. When the last consumer lets go the
//! object is marked *pending destruction*, but nothing is destroyed until
//! [`LifecycleRegistry::sweep`] runs at the end of the frame's propagation.
//! A new consumer arriving before that sweep revives the object.
//!
//! A freshly created object has no consumers, so it starts out pending: an
//! object that is created but never attached to anything is destroyed by the
//! next sweep.
//!
//! Destroyed objects are dropped from the registry. IDs are never reused, so
//! an allocated ID with no entry is known to be destroyed.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::error::LifecycleError;
use crate::id::{ObjectId, ObjectIdAllocator};

/// Bookkeeping for one registered object.
#[derive(Debug, Default)]
struct LifecycleEntry {
    /// Objects holding a reference to this one.
    consumers: Vec<ObjectId>,
    /// Objects this one holds a reference to. Released when it is destroyed.
    holding: Vec<ObjectId>,
    /// Zero consumers and not yet swept.
    pending: bool,
}

/// The outcome of one [`LifecycleRegistry::sweep`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Objects destroyed by this sweep, in ID order. The owner of the object
    /// storage must now run their destructors.
    pub destroyed: Vec<ObjectId>,
    /// Objects that lost their last consumer because a destroyed object
    /// released them. They are pending and will go in the next sweep unless
    /// revived.
    pub released: Vec<ObjectId>,
}

impl SweepReport {
    /// Returns `true` if the sweep destroyed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.destroyed.is_empty()
    }
}

/// Registry of all engine objects and the references between them.
#[derive(Debug, Default)]
pub struct LifecycleRegistry {
    /// Hands out IDs for newly created objects.
    allocator: ObjectIdAllocator,
    /// Every object created and not yet destroyed.
    entries: HashMap<ObjectId, LifecycleEntry>,
    /// Objects waiting for the next sweep.
    pending: BTreeSet<ObjectId>,
}

impl LifecycleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an ID for a new object and register it with no consumers.
    pub fn create(&mut self) -> ObjectId {
        let id = self.allocator.allocate();
        self.entries.insert(
            id,
            LifecycleEntry {
                pending: true,
                ..LifecycleEntry::default()
            },
        );
        self.pending.insert(id);
        id
    }

    /// Register `owner` as a consumer of `target`.
    ///
    /// Registering the same owner twice is a no-op. If `target` was pending
    /// destruction it is revived. Returns `true` if a new reference was
    /// recorded.
    ///
    /// `owner` may be [`ObjectId::SCENE_ROOT`], which is never registered.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::SelfReference`] if `owner == target`.
    /// - [`LifecycleError::UnknownObject`] if either object was never created.
    /// - [`LifecycleError::UseAfterDestroy`] if either object is destroyed.
    pub fn add_ref(&mut self, owner: ObjectId, target: ObjectId) -> Result<bool, LifecycleError> {
        if owner == target {
            return Err(LifecycleError::SelfReference(target));
        }
        if !owner.is_scene_root() {
            self.check_alive(owner)?;
        }
        self.check_alive(target)?;

        let entry = self
            .entries
            .get_mut(&target)
            .ok_or(LifecycleError::UnknownObject(target))?;
        if entry.consumers.contains(&owner) {
            return Ok(false);
        }
        entry.consumers.push(owner);
        if entry.pending {
            entry.pending = false;
            self.pending.remove(&target);
            debug!(object = %target, consumer = %owner, "revived object pending destruction");
        }

        if let Some(owner_entry) = self.entries.get_mut(&owner) {
            owner_entry.holding.push(target);
        }
        Ok(true)
    }

    /// Unregister `owner` as a consumer of `target`.
    ///
    /// If this was the last consumer, `target` becomes pending destruction.
    /// Nothing is destroyed here. Releasing a reference that was never taken,
    /// or one on an unknown or destroyed object, is a no-op so teardown paths
    /// may run more than once. Returns `true` if a reference was removed.
    pub fn remove_ref(&mut self, owner: ObjectId, target: ObjectId) -> bool {
        let Some(entry) = self.entries.get_mut(&target) else {
            return false;
        };
        let Some(pos) = entry.consumers.iter().position(|&c| c == owner) else {
            return false;
        };
        entry.consumers.remove(pos);
        if entry.consumers.is_empty() {
            entry.pending = true;
            self.pending.insert(target);
            debug!(object = %target, last_consumer = %owner, "object pending destruction");
        }

        if let Some(owner_entry) = self.entries.get_mut(&owner)
            && let Some(pos) = owner_entry.holding.iter().position(|&t| t == target)
        {
            owner_entry.holding.swap_remove(pos);
        }
        true
    }

    /// Destroy every object that is pending at this instant.
    ///
    /// Each destroyed object releases the references it holds. Objects that
    /// become pending through such a release are left for the next sweep.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyDestroyed`] if a pending object turns
    /// out to be destroyed already. This is an invariant violation: the
    /// registry is left in whatever state the sweep reached.
    pub fn sweep(&mut self) -> Result<SweepReport, LifecycleError> {
        let batch = std::mem::take(&mut self.pending);
        let mut report = SweepReport::default();

        for id in batch {
            let Some(entry) = self.entries.get(&id) else {
                return Err(if self.was_allocated(id) {
                    LifecycleError::AlreadyDestroyed(id)
                } else {
                    LifecycleError::UnknownObject(id)
                });
            };
            if !entry.pending || !entry.consumers.is_empty() {
                continue;
            }

            let Some(entry) = self.entries.remove(&id) else {
                continue;
            };
            report.destroyed.push(id);

            for target in entry.holding {
                if self.remove_ref(id, target) && self.is_pending(target) {
                    report.released.push(target);
                }
            }
        }

        if !report.is_empty() {
            debug!(
                destroyed = report.destroyed.len(),
                released = report.released.len(),
                "lifecycle sweep"
            );
        }
        Ok(report)
    }

    /// Returns `true` if the object is waiting for the next sweep.
    #[must_use]
    pub fn is_pending(&self, id: ObjectId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.pending)
    }

    /// Returns `true` if a sweep has destroyed the object.
    #[must_use]
    pub fn is_destroyed(&self, id: ObjectId) -> bool {
        self.was_allocated(id) && !self.entries.contains_key(&id)
    }

    /// Returns `true` if the object exists and has not been destroyed.
    #[must_use]
    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns the number of consumers of an object, or `None` if it is
    /// unknown or destroyed.
    #[must_use]
    pub fn consumer_count(&self, id: ObjectId) -> Option<usize> {
        self.entries.get(&id).map(|e| e.consumers.len())
    }

    /// Returns the consumers of an object.
    #[must_use]
    pub fn consumers(&self, id: ObjectId) -> &[ObjectId] {
        self.entries
            .get(&id)
            .map(|e| e.consumers.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the number of objects waiting for the next sweep.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns the number of objects that have not been destroyed.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }

    fn was_allocated(&self, id: ObjectId) -> bool {
        !id.is_scene_root() && id.id() <= self.allocator.count()
    }

    fn check_alive(&self, id: ObjectId) -> Result<(), LifecycleError> {
        if self.entries.contains_key(&id) {
            Ok(())
        } else if self.was_allocated(id) {
            Err(LifecycleError::UseAfterDestroy(id))
        } else {
            Err(LifecycleError::UnknownObject(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_object_is_pending() {
        let mut registry = LifecycleRegistry::new();
        let id = registry.create();
        assert!(registry.is_pending(id));
        assert_eq!(registry.pending_count(), 1);
        assert_eq!(registry.consumer_count(id), Some(0));
    }

    #[test]
    fn test_unreferenced_object_destroyed_by_sweep() {
        let mut registry = LifecycleRegistry::new();
        let id = registry.create();
        let report = registry.sweep().unwrap();
        assert_eq!(report.destroyed, vec![id]);
        assert!(registry.is_destroyed(id));
        assert!(!registry.is_alive(id));
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn test_add_ref_is_idempotent() {
        let mut registry = LifecycleRegistry::new();
        let id = registry.create();
        assert!(registry.add_ref(ObjectId::SCENE_ROOT, id).unwrap());
        assert!(!registry.add_ref(ObjectId::SCENE_ROOT, id).unwrap());
        assert_eq!(registry.consumer_count(id), Some(1));
        assert!(!registry.is_pending(id));
    }

    #[test]
    fn test_remove_ref_without_add_is_noop() {
        let mut registry = LifecycleRegistry::new();
        let owner = registry.create();
        let id = registry.create();
        registry.add_ref(ObjectId::SCENE_ROOT, id).unwrap();
        assert!(!registry.remove_ref(owner, id));
        assert_eq!(registry.consumer_count(id), Some(1));
        assert!(!registry.remove_ref(owner, ObjectId::from_raw(999)));
    }

    #[test]
    fn test_last_release_marks_pending_without_destroying() {
        let mut registry = LifecycleRegistry::new();
        let id = registry.create();
        registry.add_ref(ObjectId::SCENE_ROOT, id).unwrap();
        assert!(registry.remove_ref(ObjectId::SCENE_ROOT, id));
        assert!(registry.is_pending(id));
        assert!(registry.is_alive(id));
    }

    #[test]
    fn test_revival_before_sweep_cancels_destruction() {
        let mut registry = LifecycleRegistry::new();
        let a = registry.create();
        let b = registry.create();
        registry.add_ref(a, b).unwrap();
        registry.remove_ref(a, b);
        assert!(registry.is_pending(b));

        registry.add_ref(ObjectId::SCENE_ROOT, b).unwrap();
        assert!(!registry.is_pending(b));

        let report = registry.sweep().unwrap();
        // `a` was never referenced; `b` was revived.
        assert_eq!(report.destroyed, vec![a]);
        assert!(registry.is_alive(b));
    }

    #[test]
    fn test_object_destroyed_at_most_once() {
        let mut registry = LifecycleRegistry::new();
        let id = registry.create();
        assert_eq!(registry.sweep().unwrap().destroyed, vec![id]);
        assert!(registry.sweep().unwrap().is_empty());
        // A late release on a destroyed object does not re-queue it.
        assert!(!registry.remove_ref(ObjectId::SCENE_ROOT, id));
        assert!(registry.sweep().unwrap().is_empty());
    }

    #[test]
    fn test_add_ref_after_destroy_is_invariant_violation() {
        let mut registry = LifecycleRegistry::new();
        let id = registry.create();
        registry.sweep().unwrap();
        let err = registry.add_ref(ObjectId::SCENE_ROOT, id).unwrap_err();
        assert_eq!(err, LifecycleError::UseAfterDestroy(id));
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_self_reference_rejected() {
        let mut registry = LifecycleRegistry::new();
        let id = registry.create();
        assert_eq!(
            registry.add_ref(id, id),
            Err(LifecycleError::SelfReference(id))
        );
    }

    #[test]
    fn test_unknown_target_rejected() {
        let mut registry = LifecycleRegistry::new();
        let ghost = ObjectId::from_raw(77);
        assert_eq!(
            registry.add_ref(ObjectId::SCENE_ROOT, ghost),
            Err(LifecycleError::UnknownObject(ghost))
        );
    }

    #[test]
    fn test_destruction_cascades_one_sweep_at_a_time() {
        let mut registry = LifecycleRegistry::new();
        let actor = registry.create();
        let component = registry.create();
        registry.add_ref(ObjectId::SCENE_ROOT, actor).unwrap();
        registry.add_ref(actor, component).unwrap();

        registry.remove_ref(ObjectId::SCENE_ROOT, actor);
        let first = registry.sweep().unwrap();
        assert_eq!(first.destroyed, vec![actor]);
        assert_eq!(first.released, vec![component]);
        assert!(registry.is_pending(component));

        let second = registry.sweep().unwrap();
        assert_eq!(second.destroyed, vec![component]);
    }

    #[test]
    fn test_shared_object_survives_until_last_consumer() {
        let mut registry = LifecycleRegistry::new();
        let a = registry.create();
        let b = registry.create();
        let shared = registry.create();
        for owner in [a, b] {
            registry.add_ref(ObjectId::SCENE_ROOT, owner).unwrap();
            registry.add_ref(owner, shared).unwrap();
        }

        registry.remove_ref(ObjectId::SCENE_ROOT, a);
        let report = registry.sweep().unwrap();
        assert_eq!(report.destroyed, vec![a]);
        assert!(report.released.is_empty());
        assert_eq!(registry.consumers(shared), &[b]);
        assert!(registry.is_alive(shared));
    }

    #[test]
    fn test_live_count() {
        let mut registry = LifecycleRegistry::new();
        let keep = registry.create();
        let _drop = registry.create();
        registry.add_ref(ObjectId::SCENE_ROOT, keep).unwrap();
        assert_eq!(registry.live_count(), 2);
        registry.sweep().unwrap();
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_destroyed_objects_are_dropped() {
        let mut registry = LifecycleRegistry::new();
        let keep = registry.create();
        registry.add_ref(ObjectId::SCENE_ROOT, keep).unwrap();

        let mut last = keep;
        for _ in 0..10_000 {
            let id = registry.create();
            registry.add_ref(keep, id).unwrap();
            registry.remove_ref(keep, id);
            registry.sweep().unwrap();
            last = id;
        }

        assert_eq!(registry.entries.len(), registry.live_count());
        assert_eq!(registry.live_count(), 1);
        assert!(registry.is_destroyed(last));
        assert_eq!(registry.consumer_count(last), None);
        assert_eq!(
            registry.add_ref(keep, last),
            Err(LifecycleError::UseAfterDestroy(last))
        );
        // Never allocated, so unknown rather than destroyed.
        let ghost = ObjectId::from_raw(last.id() + 1);
        assert!(!registry.is_destroyed(ghost));
        assert_eq!(
            registry.add_ref(keep, ghost),
            Err(LifecycleError::UnknownObject(ghost))
        );
    }
}
