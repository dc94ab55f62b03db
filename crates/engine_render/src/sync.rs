//! Scene-to-proxy synchronisation.
//!
//! Runs as the last step of the update phase, after both propagation passes
//! and the lifecycle sweep. Proxies are created lazily here, on the first
//! sync of a changed mesh component, never at attach time.

use engine_scene::{HasMaterials, HasTransform, ProxyId, SceneError, SceneNode, World};
use tracing::{debug, warn};

use crate::error::ProxyError;
use crate::proxy::{ProxySink, ProxyUpdate, ProxyWrite};

/// What one [`SyncEngine::sync`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Proxies created (or taken back from orphaned).
    pub created: usize,
    /// Existing proxies overwritten.
    pub updated: usize,
    /// Orphan marks delivered to the sink.
    pub orphaned: usize,
    /// Changed components without a proxy that were marked clean.
    pub visited: usize,
    /// Pushes the sink rejected; those components stay dirty.
    pub failed: usize,
}

impl SyncReport {
    /// Returns the number of successful proxy writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.created + self.updated
    }
}

/// Pushes changed scene state into a [`ProxySink`].
#[derive(Debug, Default)]
pub struct SyncEngine {
    passes: u64,
}

impl SyncEngine {
    /// Create a sync engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many times [`SyncEngine::sync`] has run.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Deliver the orphan marks queued by the scene since the last call.
    /// Returns the number delivered.
    pub fn flush_orphans(&mut self, world: &mut World, sink: &impl ProxySink) -> usize {
        let orphaned = world.drain_orphaned_proxies();
        for &proxy in &orphaned {
            sink.mark_orphaned(proxy);
        }
        orphaned.len()
    }

    /// Visit every changed component, parents before children, and push
    /// mesh components into their proxies.
    ///
    /// A component is marked clean only after its push succeeds. A rejected
    /// push is logged and counted; the component stays dirty and the pass
    /// continues with the next one.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Scene`] if the scene cannot describe a changed
    /// component. That means the arena is corrupt.
    pub fn sync(&mut self, world: &mut World, sink: &impl ProxySink) -> Result<SyncReport, ProxyError> {
        self.passes += 1;
        let mut report = SyncReport {
            orphaned: self.flush_orphans(world, sink),
            ..SyncReport::default()
        };

        for id in world.changed_components() {
            let renderable = world.component(id).is_some_and(|c| c.mesh().is_some());
            if !renderable {
                world.mark_synced(id)?;
                report.visited += 1;
                continue;
            }

            let world_bounds = world.world_bounds(id)?;
            let world_transform = world.local_to_world(id)?.to_matrix();
            let component = world.component(id).ok_or(SceneError::ComponentNotFound(id))?;
            let mesh = component.mesh().ok_or(SceneError::NotRenderable(id))?;
            let bound = mesh.proxy();
            let proxy = bound.unwrap_or(ProxyId::for_component(id));
            let update = ProxyUpdate {
                world_transform,
                world_bounds,
                materials: component.materials().unwrap_or_default().to_vec(),
                geometry: mesh.geometry().clone(),
                visible: component.scene_node().is_some_and(SceneNode::is_visible),
            };

            match sink.create_or_update(proxy, update) {
                Ok(write) => {
                    if bound.is_none() {
                        world.bind_proxy(id, proxy)?;
                    }
                    world.mark_synced(id)?;
                    match write {
                        ProxyWrite::Created => report.created += 1,
                        ProxyWrite::Updated => report.updated += 1,
                    }
                }
                Err(err) => {
                    warn!(component = %id, proxy = %proxy, error = %err, "proxy push failed");
                    report.failed += 1;
                }
            }
        }

        if report.writes() > 0 || report.orphaned > 0 {
            debug!(
                created = report.created,
                updated = report.updated,
                orphaned = report.orphaned,
                failed = report.failed,
                "synced proxies"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use engine_math::{Aabb, Transform, Vec3, Vec4};
    use engine_scene::{ActorId, ComponentId, GeometryRef, MeshRenderer, propagate_down, propagate_up};

    use super::*;
    use crate::proxy::RenderScene;

    /// Wraps a [`RenderScene`], records every call and can be told to reject
    /// writes.
    #[derive(Default)]
    struct RecordingSink {
        inner: RenderScene,
        writes: Mutex<Vec<ProxyId>>,
        orphaned: Mutex<Vec<ProxyId>>,
        reject: AtomicBool,
    }

    impl RecordingSink {
        fn writes(&self) -> Vec<ProxyId> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl ProxySink for RecordingSink {
        fn create_or_update(
            &self,
            proxy: ProxyId,
            update: ProxyUpdate,
        ) -> Result<ProxyWrite, ProxyError> {
            if self.reject.load(Ordering::SeqCst) {
                return Err(ProxyError::Rejected {
                    proxy,
                    reason: "device lost".to_string(),
                });
            }
            self.writes.lock().unwrap().push(proxy);
            self.inner.create_or_update(proxy, update)
        }

        fn mark_orphaned(&self, proxy: ProxyId) {
            self.orphaned.lock().unwrap().push(proxy);
            self.inner.mark_orphaned(proxy);
        }

        fn sweep_orphaned(&self) -> usize {
            self.inner.sweep_orphaned()
        }
    }

    fn make_mesh(world: &mut World, name: &str, translation: Vec3) -> ComponentId {
        world.create_mesh_component(
            name,
            Transform::from_translation(translation),
            MeshRenderer::new(GeometryRef::new("cube")),
            Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)),
        )
    }

    /// `body` (scene) at x = 5 with a mesh child at local x = 1.
    fn make_scene(world: &mut World) -> (ActorId, ComponentId, ComponentId) {
        let actor = world.spawn_actor("ship").unwrap();
        let body = world.create_scene_component(
            "body",
            Transform::from_translation(Vec3::new(5.0, 0.0, 0.0)),
        );
        let hull = make_mesh(world, "hull", Vec3::X);
        world.attach_component(actor, body).unwrap();
        world.add_child(body, hull).unwrap();
        (actor, body, hull)
    }

    fn run_frame(world: &mut World, engine: &mut SyncEngine, sink: &impl ProxySink) -> SyncReport {
        propagate_up(world);
        propagate_down(world);
        world.collect_garbage().unwrap();
        engine.sync(world, sink).unwrap()
    }

    #[test]
    fn test_first_sync_creates_proxies_for_meshes_only() {
        let mut world = World::new();
        let (_, body, hull) = make_scene(&mut world);
        let sink = RecordingSink::default();
        let mut engine = SyncEngine::new();

        let report = run_frame(&mut world, &mut engine, &sink);
        assert_eq!(report.created, 1);
        assert_eq!(report.visited, 1);
        assert_eq!(sink.writes(), vec![ProxyId::for_component(hull)]);

        let proxy = world.component(hull).unwrap().mesh().unwrap().proxy();
        assert_eq!(proxy, Some(ProxyId::for_component(hull)));
        assert!(!world.component(body).unwrap().has_changes());

        let stored = sink.inner.get(ProxyId::for_component(hull)).unwrap();
        let position = stored.state().world_transform.w_axis.truncate();
        assert!(position.abs_diff_eq(Vec3::new(6.0, 0.0, 0.0), 1e-5));
        assert_eq!(stored.state().world_bounds.center(), Vec3::new(6.0, 0.0, 0.0));
    }

    #[test]
    fn test_unchanged_frame_writes_nothing() {
        let mut world = World::new();
        make_scene(&mut world);
        let sink = RecordingSink::default();
        let mut engine = SyncEngine::new();
        run_frame(&mut world, &mut engine, &sink);

        let report = run_frame(&mut world, &mut engine, &sink);
        assert_eq!(report, SyncReport::default());
        assert_eq!(sink.writes().len(), 1);
        assert_eq!(engine.passes(), 2);
    }

    #[test]
    fn test_moving_parent_updates_child_proxy() {
        let mut world = World::new();
        let (_, body, hull) = make_scene(&mut world);
        let sink = RecordingSink::default();
        let mut engine = SyncEngine::new();
        run_frame(&mut world, &mut engine, &sink);

        world.set_relative_translation(body, Vec3::new(-3.0, 0.0, 0.0)).unwrap();
        let report = run_frame(&mut world, &mut engine, &sink);
        assert_eq!(report.updated, 1);

        let stored = sink.inner.get(ProxyId::for_component(hull)).unwrap();
        let position = stored.state().world_transform.w_axis.truncate();
        assert!(position.abs_diff_eq(Vec3::new(-2.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_material_and_visibility_pushed() {
        let mut world = World::new();
        let (_, _, hull) = make_scene(&mut world);
        let paint = world.create_material("paint", Vec4::new(1.0, 0.0, 0.0, 1.0));
        world.set_materials(hull, &[paint]).unwrap();
        let sink = RecordingSink::default();
        let mut engine = SyncEngine::new();
        run_frame(&mut world, &mut engine, &sink);

        world.set_visible(hull, false).unwrap();
        run_frame(&mut world, &mut engine, &sink);

        let stored = sink.inner.get(ProxyId::for_component(hull)).unwrap();
        assert_eq!(stored.state().materials, vec![paint]);
        assert!(!stored.state().visible);
        assert!(sink.inner.drawable().is_empty());
    }

    #[test]
    fn test_rejected_push_keeps_component_dirty() {
        let mut world = World::new();
        let (_, _, hull) = make_scene(&mut world);
        let sink = RecordingSink::default();
        let mut engine = SyncEngine::new();

        sink.reject.store(true, Ordering::SeqCst);
        let report = run_frame(&mut world, &mut engine, &sink);
        assert_eq!(report.failed, 1);
        assert!(world.component(hull).unwrap().has_changes());
        assert_eq!(world.component(hull).unwrap().mesh().unwrap().proxy(), None);

        sink.reject.store(false, Ordering::SeqCst);
        let report = run_frame(&mut world, &mut engine, &sink);
        assert_eq!(report.created, 1);
        assert!(!world.component(hull).unwrap().has_changes());
    }

    #[test]
    fn test_detached_proxy_survives_until_render_sweep() {
        let mut world = World::new();
        let (actor, body, hull) = make_scene(&mut world);
        let sink = RecordingSink::default();
        let mut engine = SyncEngine::new();
        run_frame(&mut world, &mut engine, &sink);

        world.detach_component(actor, body).unwrap();
        let report = run_frame(&mut world, &mut engine, &sink);
        let proxy = ProxyId::for_component(hull);
        assert_eq!(report.orphaned, 1);
        assert_eq!(*sink.orphaned.lock().unwrap(), vec![proxy]);

        // Still readable during this frame's render phase.
        assert!(sink.inner.contains(proxy));
        assert_eq!(sink.sweep_orphaned(), 1);
        assert!(!sink.inner.contains(proxy));
    }

    #[test]
    fn test_destroyed_actor_orphans_proxies() {
        let mut world = World::new();
        let (actor, _, hull) = make_scene(&mut world);
        let sink = RecordingSink::default();
        let mut engine = SyncEngine::new();
        run_frame(&mut world, &mut engine, &sink);

        world.destroy_actor(actor).unwrap();
        let report = run_frame(&mut world, &mut engine, &sink);
        assert_eq!(report.orphaned, 1);
        assert!(sink.inner.get(ProxyId::for_component(hull)).unwrap().is_orphaned());
    }
}
