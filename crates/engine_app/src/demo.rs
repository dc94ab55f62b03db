//! Demo scene: an orrery.
//!
//! A hub spins in place with moons parented under it, so moving one node
//! moves a whole subtree. A beacon under the hub uses an absolute
//! translation and stays put while the hub turns. A comet actor is spawned
//! and destroyed periodically to exercise deferred destruction and proxy
//! orphaning.

use std::f32::consts::TAU;

use engine_frame::FrameContext;
use engine_math::{Aabb, Quat, Transform, Vec3, Vec4};
use engine_scene::{
    ActorId, ComponentId, GeometryRef, HasTransform, MeshRenderer, SceneError, World,
};
use tracing::debug;

/// Number of moons orbiting the hub.
pub const MOON_COUNT: usize = 4;

/// Radians the hub turns per second.
const HUB_SPIN: f32 = 0.8;

/// Frames between comet spawns; the comet lives half of this.
const COMET_PERIOD: u64 = 90;

/// Handles into the demo scene.
#[derive(Debug)]
pub struct Orrery {
    /// The actor owning the hub tree.
    pub actor: ActorId,
    /// The spinning root component.
    pub hub: ComponentId,
    /// Mesh components orbiting with the hub.
    pub moons: Vec<ComponentId>,
    /// Mesh with an absolute translation.
    pub beacon: ComponentId,
    /// The current comet, if one is alive.
    pub comet: Option<ActorId>,
    angle: f32,
}

fn unit_cube() -> Aabb {
    Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5))
}

fn make_mesh(world: &mut World, name: &str, transform: Transform, geometry: &str) -> ComponentId {
    world.create_mesh_component(name, transform, MeshRenderer::new(GeometryRef::new(geometry)), unit_cube())
}

impl Orrery {
    /// Build the scene.
    ///
    /// # Errors
    ///
    /// Propagates any structural error from the scene.
    pub fn build(world: &mut World) -> Result<Self, SceneError> {
        let actor = world.spawn_actor("orrery")?;
        let hub = world.create_scene_component("hub", Transform::IDENTITY);
        world.attach_component(actor, hub)?;

        let stone = world.create_material("stone", Vec4::new(0.6, 0.6, 0.6, 1.0));
        let ice = world.create_material("ice", Vec4::new(0.7, 0.9, 1.0, 1.0));

        let mut moons = Vec::with_capacity(MOON_COUNT);
        for i in 0..MOON_COUNT {
            let phase = i as f32 / MOON_COUNT as f32 * TAU;
            let radius = 3.0 + i as f32;
            let offset = Vec3::new(phase.cos() * radius, 0.0, phase.sin() * radius);
            let moon = make_mesh(world, "moon", Transform::from_translation(offset), "sphere");
            world.add_child(hub, moon)?;
            world.set_materials(moon, &[if i % 2 == 0 { stone } else { ice }])?;
            moons.push(moon);
        }

        let beacon = make_mesh(
            world,
            "beacon",
            Transform::from_translation(Vec3::new(0.0, 5.0, 0.0)).with_absolute_translation(true),
            "cone",
        );
        world.add_child(hub, beacon)?;
        world.set_materials(beacon, &[ice])?;

        Ok(Self {
            actor,
            hub,
            moons,
            beacon,
            comet: None,
            angle: 0.0,
        })
    }

    /// Per-frame game logic.
    ///
    /// # Errors
    ///
    /// Propagates any structural error from the scene.
    pub fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), SceneError> {
        self.angle = (self.angle + HUB_SPIN * ctx.dt) % TAU;
        ctx.world
            .set_relative_rotation(self.hub, Quat::from_rotation_y(self.angle))?;

        // Blink the first moon.
        if ctx.frame % 60 == 0
            && let Some(&moon) = self.moons.first()
        {
            let visible = ctx
                .world
                .component(moon)
                .and_then(|c| c.scene_node())
                .is_some_and(|node| node.is_visible());
            ctx.world.set_visible(moon, !visible)?;
        }

        match ctx.frame % COMET_PERIOD {
            0 => {
                let comet = ctx.world.spawn_actor("comet")?;
                let body = make_mesh(
                    ctx.world,
                    "comet_body",
                    Transform::from_translation(Vec3::new(10.0, 1.0, 0.0)),
                    "sphere",
                );
                ctx.world.attach_component(comet, body)?;
                debug!(frame = ctx.frame, actor = %comet, "comet spawned");
                self.comet = Some(comet);
            }
            n if n == COMET_PERIOD / 2 => {
                if let Some(comet) = self.comet.take() {
                    ctx.world.destroy_actor(comet)?;
                    debug!(frame = ctx.frame, actor = %comet, "comet destroyed");
                }
            }
            _ => {}
        }
        Ok(())
    }
}
