//! The scene arena.
//!
//! The [`World`] owns every actor, component and material, keyed by ID. All
//! structural back-references (a component's owner, parent and ancestor
//! chain) are IDs resolved through the arena, so the world is the single
//! owner of everything and there are no reference cycles.
//!
//! Ownership edges are mirrored into the [`LifecycleRegistry`]:
//!
//! | Edge                          | Taken by              | Released by                         |
//! |-------------------------------|-----------------------|-------------------------------------|
//! | scene root → actor            | [`World::spawn_actor`] | [`World::destroy_actor`]            |
//! | actor → component             | [`World::attach_component`] | [`World::detach_component`]   |
//! | parent → child component      | [`World::add_child`]  | [`World::remove_child`]             |
//! | mesh component → material     | [`World::set_materials`] | [`World::set_materials`]         |
//!
//! Objects are only removed from the arena by [`World::collect_garbage`].

use std::collections::HashMap;

use engine_math::{Aabb, Quat, Transform, Vec3, Vec4, WorldTransform};
use engine_object::{LifecycleRegistry, ObjectId};
use tracing::debug;

use crate::actor::Actor;
use crate::component::{
    Component, ComponentClass, ComponentKind, HasTransform, MeshRenderer, SceneNode,
};
use crate::error::SceneError;
use crate::ids::{ActorId, ComponentId, MaterialId, ProxyId};
use crate::material::Material;

/// What one [`World::collect_garbage`] call destroyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GarbageReport {
    /// Actors removed from the arena.
    pub actors: usize,
    /// Components removed from the arena.
    pub components: usize,
    /// Materials removed from the arena.
    pub materials: usize,
    /// Objects left pending for the next collection because a destroyed
    /// object released them.
    pub released: usize,
}

impl GarbageReport {
    /// Total number of objects destroyed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.actors + self.components + self.materials
    }

    /// Returns `true` if nothing was destroyed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// The scene: actors, their component trees, and shared materials.
#[derive(Debug, Default)]
pub struct World {
    /// Reference counts and pending destruction for every object.
    lifecycle: LifecycleRegistry,
    pub(crate) actors: HashMap<ActorId, Actor>,
    /// Actors in spawn order; traversals follow it.
    pub(crate) actor_order: Vec<ActorId>,
    pub(crate) components: HashMap<ComponentId, Component>,
    materials: HashMap<MaterialId, Material>,
    /// Proxies whose components left the scene since the last sync.
    orphaned_proxies: Vec<ProxyId>,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Object creation ─────────────────────────────────────────────────────

    /// Spawn a new actor. The world holds it until [`World::destroy_actor`].
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Lifecycle`] if the registry rejects the new
    /// reference.
    pub fn spawn_actor(&mut self, name: impl Into<String>) -> Result<ActorId, SceneError> {
        let id = ActorId(self.lifecycle.create());
        self.lifecycle.add_ref(ObjectId::SCENE_ROOT, id.object())?;

        let name = name.into();
        debug!(actor = %id, name = %name, "spawned actor");
        self.actors.insert(id, Actor::new(id, name));
        self.actor_order.push(id);
        Ok(id)
    }

    /// Request destruction of an actor.
    ///
    /// The actor stays in the world until the next
    /// [`World::collect_garbage`]. Its components are released then and
    /// collected one pass later unless they have been attached elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::ActorNotFound`] if the actor does not exist.
    pub fn destroy_actor(&mut self, actor: ActorId) -> Result<(), SceneError> {
        if !self.actors.contains_key(&actor) {
            return Err(SceneError::ActorNotFound(actor));
        }
        if self.lifecycle.remove_ref(ObjectId::SCENE_ROOT, actor.object()) {
            debug!(actor = %actor, "actor destruction requested");
        }
        Ok(())
    }

    /// Create a detached component.
    ///
    /// Until it is attached to an actor or parented under another component
    /// nothing holds it, so the next garbage collection destroys it.
    pub fn create_component(&mut self, name: impl Into<String>, kind: ComponentKind) -> ComponentId {
        let id = ComponentId(self.lifecycle.create());
        let component = Component::new(id, name.into(), kind);
        debug!(component = %id, kind = component.kind.label(), "created component");
        self.components.insert(id, component);
        id
    }

    /// Create a detached scene component.
    pub fn create_scene_component(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
    ) -> ComponentId {
        self.create_component(name, ComponentKind::scene(transform))
    }

    /// Create a detached mesh component.
    pub fn create_mesh_component(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        mesh: MeshRenderer,
        local_bounds: Aabb,
    ) -> ComponentId {
        self.create_component(
            name,
            ComponentKind::Mesh {
                node: SceneNode::new(transform).with_bounds(local_bounds),
                mesh,
            },
        )
    }

    /// Create a material. It is collected unless a mesh starts using it
    /// before the next garbage collection.
    pub fn create_material(&mut self, name: impl Into<String>, base_color: Vec4) -> MaterialId {
        let id = MaterialId(self.lifecycle.create());
        self.materials.insert(
            id,
            Material {
                id,
                name: name.into(),
                base_color,
            },
        );
        id
    }

    // ── Actor structure ─────────────────────────────────────────────────────

    /// Attach a component (and its existing scene descendants) to an actor.
    ///
    /// The component's name and every descendant's name are registered in
    /// the actor's name index. The first scene component attached to an
    /// actor becomes its root component.
    ///
    /// # Errors
    ///
    /// - [`SceneError::ActorNotFound`] / [`SceneError::ComponentNotFound`].
    /// - [`SceneError::AlreadyOwned`] if the component belongs to an actor.
    /// - [`SceneError::AlreadyParented`] if the component has a parent.
    ///
    /// Nothing is modified when an error is returned.
    pub fn attach_component(
        &mut self,
        actor: ActorId,
        component: ComponentId,
    ) -> Result<(), SceneError> {
        if !self.actors.contains_key(&actor) {
            return Err(SceneError::ActorNotFound(actor));
        }
        let record = self.component_record(component)?;
        if let Some(owner) = record.owner {
            return Err(SceneError::AlreadyOwned { component, owner });
        }
        if let Some(parent) = record.scene_node().and_then(SceneNode::parent) {
            return Err(SceneError::AlreadyParented { component, parent });
        }
        let spatial = record.is_spatial();

        self.lifecycle.add_ref(actor.object(), component.object())?;
        self.adopt_subtree(component, actor);

        if let Some(owner) = self.actors.get_mut(&actor) {
            owner.components.push(component);
            if spatial && owner.root.is_none() {
                owner.root = Some(component);
            }
        }
        self.mark_transform_changed(component);
        debug!(actor = %actor, component = %component, "attached component");
        Ok(())
    }

    /// Detach a component from an actor.
    ///
    /// Names are unregistered for the whole subtree, the root pointer is
    /// cleared if it pointed at the component, proxies in the subtree are
    /// orphaned and the actor's reference is released. The component can be
    /// attached again before the next garbage collection.
    ///
    /// # Errors
    ///
    /// - [`SceneError::ActorNotFound`] if the actor does not exist.
    /// - [`SceneError::NotAttached`] if the component is not attached
    ///   directly to the actor.
    pub fn detach_component(
        &mut self,
        actor: ActorId,
        component: ComponentId,
    ) -> Result<(), SceneError> {
        let owner = self
            .actors
            .get_mut(&actor)
            .ok_or(SceneError::ActorNotFound(actor))?;
        let Some(pos) = owner.components.iter().position(|&c| c == component) else {
            return Err(SceneError::NotAttached { actor, component });
        };
        owner.components.remove(pos);
        if owner.root == Some(component) {
            owner.root = None;
        }

        self.release_subtree(component, actor);
        self.lifecycle.remove_ref(actor.object(), component.object());
        debug!(actor = %actor, component = %component, "detached component");
        Ok(())
    }

    // ── Component hierarchy ─────────────────────────────────────────────────

    /// Parent `child` under `parent`.
    ///
    /// The child's ancestor chain becomes the parent's chain plus the parent,
    /// recomputed for every existing descendant of the child. If the parent
    /// belongs to an actor, the child subtree joins that actor and its names
    /// are registered.
    ///
    /// # Errors
    ///
    /// - [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    /// - [`SceneError::AlreadyParented`] if the child has a parent.
    /// - [`SceneError::WouldCreateCycle`] if the child is the parent or one
    ///   of its ancestors.
    /// - [`SceneError::AlreadyOwned`] if the child is attached directly to an
    ///   actor.
    ///
    /// Nothing is modified when an error is returned.
    pub fn add_child(&mut self, parent: ComponentId, child: ComponentId) -> Result<(), SceneError> {
        let parent_record = self.component_record(parent)?;
        let parent_node = parent_record
            .scene_node()
            .ok_or(SceneError::NotSpatial(parent))?;
        let actor = parent_record.owner;
        let mut chain = parent_node.ancestors.clone();
        chain.push(parent);

        let child_record = self.component_record(child)?;
        let child_node = child_record
            .scene_node()
            .ok_or(SceneError::NotSpatial(child))?;
        if let Some(existing) = child_node.parent {
            return Err(SceneError::AlreadyParented {
                component: child,
                parent: existing,
            });
        }
        if chain.contains(&child) {
            return Err(SceneError::WouldCreateCycle { parent, child });
        }
        if let Some(owner) = child_record.owner {
            return Err(SceneError::AlreadyOwned {
                component: child,
                owner,
            });
        }

        self.lifecycle.add_ref(parent.object(), child.object())?;

        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        self.rebase_subtree(child, chain);
        if let Some(actor) = actor {
            self.adopt_subtree(child, actor);
        }
        self.mark_transform_changed(child);
        debug!(parent = %parent, child = %child, "added child component");
        Ok(())
    }

    /// Remove `child` from `parent`.
    ///
    /// The child subtree leaves its actor (names unregistered, proxies
    /// orphaned) and the parent's reference is released.
    ///
    /// # Errors
    ///
    /// - [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    /// - [`SceneError::NotAChild`] if `child`'s parent is not `parent`.
    pub fn remove_child(
        &mut self,
        parent: ComponentId,
        child: ComponentId,
    ) -> Result<(), SceneError> {
        let record = self.component_record(child)?;
        let node = record.scene_node().ok_or(SceneError::NotSpatial(child))?;
        if node.parent != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        let actor = record.owner;

        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        self.rebase_subtree(child, Vec::new());
        if let Some(actor) = actor {
            self.release_subtree(child, actor);
        }
        self.lifecycle.remove_ref(parent.object(), child.object());
        self.mark_transform_changed(child);
        debug!(parent = %parent, child = %child, "removed child component");
        Ok(())
    }

    // ── Lookup ──────────────────────────────────────────────────────────────

    /// Returns the first component named `name` in the actor's tree that is
    /// assignable to class `C`.
    ///
    /// Uses the actor's name index, not a tree walk.
    #[must_use]
    pub fn get_component_by_name<C: ComponentClass>(
        &self,
        actor: ActorId,
        name: &str,
    ) -> Option<ComponentId> {
        self.actors
            .get(&actor)?
            .names
            .get(name)
            .iter()
            .copied()
            .find(|id| self.components.get(id).is_some_and(|c| C::accepts(&c.kind)))
    }

    /// Returns every component named `name` in the actor's tree, in
    /// registration order.
    #[must_use]
    pub fn components_by_name(&self, actor: ActorId, name: &str) -> &[ComponentId] {
        self.actors
            .get(&actor)
            .map(|a| a.names.get(name))
            .unwrap_or(&[])
    }

    /// Returns the first actor (in spawn order) with the given name.
    #[must_use]
    pub fn find_actor_by_name(&self, name: &str) -> Option<ActorId> {
        self.actor_order
            .iter()
            .copied()
            .find(|id| self.actors.get(id).is_some_and(|a| a.name == name))
    }

    /// Returns an actor by ID.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Returns all actors in spawn order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actor_order.iter().filter_map(|id| self.actors.get(id))
    }

    /// Returns a component by ID.
    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    /// Returns a material by ID.
    #[must_use]
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    /// Returns the lifecycle registry.
    #[must_use]
    pub fn lifecycle(&self) -> &LifecycleRegistry {
        &self.lifecycle
    }

    /// Returns the number of actors in the arena.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Returns the number of components in the arena.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Returns the number of materials in the arena.
    #[must_use]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    // ── Transform, visibility and materials ─────────────────────────────────

    /// Set the relative translation.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    pub fn set_relative_translation(
        &mut self,
        id: ComponentId,
        translation: Vec3,
    ) -> Result<(), SceneError> {
        self.update_transform(id, |t| t.translation = translation)
    }

    /// Set the relative rotation.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    pub fn set_relative_rotation(&mut self, id: ComponentId, rotation: Quat) -> Result<(), SceneError> {
        self.update_transform(id, |t| t.rotation = rotation)
    }

    /// Set the relative scale.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    pub fn set_relative_scale(&mut self, id: ComponentId, scale: Vec3) -> Result<(), SceneError> {
        self.update_transform(id, |t| t.scale = scale)
    }

    /// Replace the whole relative transform, absolute flags included.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    pub fn set_relative_transform(
        &mut self,
        id: ComponentId,
        transform: Transform,
    ) -> Result<(), SceneError> {
        self.update_transform(id, |t| *t = transform)
    }

    /// Make the translation channel ignore (or stop ignoring) ancestors.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    pub fn set_absolute_translation(&mut self, id: ComponentId, absolute: bool) -> Result<(), SceneError> {
        self.update_transform(id, |t| t.absolute.translation = absolute)
    }

    /// Make the rotation channel ignore (or stop ignoring) ancestors.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    pub fn set_absolute_rotation(&mut self, id: ComponentId, absolute: bool) -> Result<(), SceneError> {
        self.update_transform(id, |t| t.absolute.rotation = absolute)
    }

    /// Make the scale channel ignore (or stop ignoring) ancestors.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    pub fn set_absolute_scale(&mut self, id: ComponentId, absolute: bool) -> Result<(), SceneError> {
        self.update_transform(id, |t| t.absolute.scale = absolute)
    }

    /// Show or hide a scene component.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    pub fn set_visible(&mut self, id: ComponentId, visible: bool) -> Result<(), SceneError> {
        let component = self
            .components
            .get_mut(&id)
            .ok_or(SceneError::ComponentNotFound(id))?;
        let node = component.node_mut().ok_or(SceneError::NotSpatial(id))?;
        if node.visible != visible {
            node.visible = visible;
            component.dirty.on_material_changed();
        }
        Ok(())
    }

    /// Replace a mesh component's materials.
    ///
    /// The mesh takes a reference on every new material before releasing the
    /// ones it no longer uses, so a material kept across the change is never
    /// pending in between.
    ///
    /// # Errors
    ///
    /// - [`SceneError::ComponentNotFound`] / [`SceneError::NotRenderable`].
    /// - [`SceneError::MaterialNotFound`] if any material does not exist.
    pub fn set_materials(
        &mut self,
        id: ComponentId,
        materials: &[MaterialId],
    ) -> Result<(), SceneError> {
        let record = self.component_record(id)?;
        let mesh = record.mesh().ok_or(SceneError::NotRenderable(id))?;
        if let Some(missing) = materials.iter().find(|m| !self.materials.contains_key(*m)) {
            return Err(SceneError::MaterialNotFound(*missing));
        }
        let previous = mesh.materials.clone();

        for material in materials {
            self.lifecycle.add_ref(id.object(), material.object())?;
        }
        for material in previous.iter().filter(|m| !materials.contains(*m)) {
            self.lifecycle.remove_ref(id.object(), material.object());
        }

        if let Some(component) = self.components.get_mut(&id) {
            if let Some(mesh) = component.mesh_mut() {
                mesh.materials = materials.to_vec();
            }
            component.dirty.on_material_changed();
        }
        Ok(())
    }

    // ── World-space queries ─────────────────────────────────────────────────

    /// Compute a component's world transform from its ancestor chain.
    ///
    /// Recomputed on every call (O(depth)), so the result always reflects the
    /// current relative transforms. Callers that need one value per frame
    /// capture it once during sync.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    pub fn local_to_world(&self, id: ComponentId) -> Result<WorldTransform, SceneError> {
        let node = self
            .component_record(id)?
            .scene_node()
            .ok_or(SceneError::NotSpatial(id))?;

        let mut chain = Vec::with_capacity(node.ancestors.len() + 1);
        for &ancestor in &node.ancestors {
            let ancestor_node = self
                .component_record(ancestor)?
                .scene_node()
                .ok_or(SceneError::NotSpatial(ancestor))?;
            chain.push(&ancestor_node.transform);
        }
        chain.push(&node.transform);
        Ok(WorldTransform::compose(chain))
    }

    /// Returns the component's world-space position.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    pub fn world_translation(&self, id: ComponentId) -> Result<Vec3, SceneError> {
        Ok(self.local_to_world(id)?.translation)
    }

    /// Transform the component's local bounds into world space, store the
    /// result on the node and return it.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotSpatial`].
    pub fn world_bounds(&mut self, id: ComponentId) -> Result<Aabb, SceneError> {
        let matrix = self.local_to_world(id)?.to_matrix();
        let node = self.node_mut(id).ok_or(SceneError::NotSpatial(id))?;
        node.world_bounds = node.local_bounds.transformed(&matrix);
        Ok(node.world_bounds)
    }

    // ── Garbage collection ──────────────────────────────────────────────────

    /// Sweep the lifecycle registry and drop every destroyed object from the
    /// arena.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Lifecycle`] if the sweep detects an invariant
    /// violation.
    pub fn collect_garbage(&mut self) -> Result<GarbageReport, SceneError> {
        let sweep = self.lifecycle.sweep()?;
        let mut report = GarbageReport {
            released: sweep.released.len(),
            ..GarbageReport::default()
        };
        for object in sweep.destroyed {
            self.destroy_object(object, &mut report);
        }
        if !report.is_empty() {
            debug!(
                actors = report.actors,
                components = report.components,
                materials = report.materials,
                released = report.released,
                "collected garbage"
            );
        }
        Ok(report)
    }

    // ── Sync support ────────────────────────────────────────────────────────

    /// Returns every changed component reachable from an actor, parents
    /// before children, actors in spawn order.
    ///
    /// Subtrees whose root is clean are skipped; after both propagation
    /// passes a clean component has no changed descendants.
    #[must_use]
    pub fn changed_components(&self) -> Vec<ComponentId> {
        let mut changed = Vec::new();
        let mut stack = Vec::new();
        for actor in self.actors() {
            stack.extend(actor.components.iter().rev().copied());
            while let Some(id) = stack.pop() {
                let Some(component) = self.components.get(&id) else {
                    continue;
                };
                if !component.has_changes() {
                    continue;
                }
                changed.push(id);
                stack.extend(component.children().iter().rev().copied());
            }
        }
        changed
    }

    /// Record the proxy created for a mesh component.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] / [`SceneError::NotRenderable`].
    pub fn bind_proxy(&mut self, id: ComponentId, proxy: ProxyId) -> Result<(), SceneError> {
        let mesh = self
            .components
            .get_mut(&id)
            .ok_or(SceneError::ComponentNotFound(id))?
            .mesh_mut()
            .ok_or(SceneError::NotRenderable(id))?;
        mesh.proxy = Some(proxy);
        Ok(())
    }

    /// Mark a component as matching its proxy.
    ///
    /// # Errors
    ///
    /// [`SceneError::ComponentNotFound`] if the component does not exist.
    pub fn mark_synced(&mut self, id: ComponentId) -> Result<(), SceneError> {
        let component = self
            .components
            .get_mut(&id)
            .ok_or(SceneError::ComponentNotFound(id))?;
        component.dirty = crate::component::DirtyState::Clean;
        Ok(())
    }

    /// Take the proxies orphaned since the last call.
    pub fn drain_orphaned_proxies(&mut self) -> Vec<ProxyId> {
        std::mem::take(&mut self.orphaned_proxies)
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn component_record(&self, id: ComponentId) -> Result<&Component, SceneError> {
        self.components
            .get(&id)
            .ok_or(SceneError::ComponentNotFound(id))
    }

    fn node_mut(&mut self, id: ComponentId) -> Option<&mut SceneNode> {
        self.components.get_mut(&id).and_then(Component::node_mut)
    }

    fn update_transform(
        &mut self,
        id: ComponentId,
        apply: impl FnOnce(&mut Transform),
    ) -> Result<(), SceneError> {
        let component = self
            .components
            .get_mut(&id)
            .ok_or(SceneError::ComponentNotFound(id))?;
        let node = component.node_mut().ok_or(SceneError::NotSpatial(id))?;
        let before = node.transform;
        apply(&mut node.transform);
        if node.transform != before {
            node.transform_dirty = true;
            component.dirty.on_transform_changed();
        }
        Ok(())
    }

    fn mark_transform_changed(&mut self, id: ComponentId) {
        if let Some(component) = self.components.get_mut(&id)
            && let Some(node) = component.node_mut()
        {
            node.transform_dirty = true;
            component.dirty.on_transform_changed();
        }
    }

    /// Pre-order list of `root` and its scene descendants.
    fn subtree(&self, root: ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(component) = self.components.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(component.children().iter().rev().copied());
        }
        out
    }

    /// Reset the ancestor chain of `root` to `chain` and rebuild it for every
    /// descendant.
    fn rebase_subtree(&mut self, root: ComponentId, chain: Vec<ComponentId>) {
        let mut stack = vec![(root, chain)];
        while let Some((id, chain)) = stack.pop() {
            let Some(node) = self.node_mut(id) else {
                continue;
            };
            let mut child_chain = chain.clone();
            child_chain.push(id);
            node.ancestors = chain;
            for &child in &node.children {
                stack.push((child, child_chain.clone()));
            }
        }
    }

    /// Give every component in the subtree to `actor` and index its name.
    fn adopt_subtree(&mut self, root: ComponentId, actor: ActorId) {
        for id in self.subtree(root) {
            let Some(component) = self.components.get_mut(&id) else {
                continue;
            };
            component.owner = Some(actor);
            if let Some(owner) = self.actors.get_mut(&actor) {
                owner.names.register(&component.name, id);
            }
        }
    }

    /// Take every component in the subtree away from `actor`, unindex its
    /// name and orphan its proxy.
    fn release_subtree(&mut self, root: ComponentId, actor: ActorId) {
        for id in self.subtree(root) {
            let Some(component) = self.components.get_mut(&id) else {
                continue;
            };
            component.owner = None;
            if let Some(owner) = self.actors.get_mut(&actor) {
                owner.names.unregister(&component.name, id);
            }
            if let Some(proxy) = component.mesh_mut().and_then(|mesh| mesh.proxy.take()) {
                self.orphaned_proxies.push(proxy);
            }
        }
    }

    /// Run the destructor of an object the registry has destroyed.
    fn destroy_object(&mut self, object: ObjectId, report: &mut GarbageReport) {
        let actor_id = ActorId(object);
        if let Some(actor) = self.actors.remove(&actor_id) {
            self.actor_order.retain(|&id| id != actor_id);
            for &component in &actor.components {
                self.release_subtree(component, actor_id);
            }
            debug!(actor = %actor_id, name = %actor.name, "destroyed actor");
            report.actors += 1;
            return;
        }

        let component_id = ComponentId(object);
        if let Some(component) = self.components.remove(&component_id) {
            // The registry already released the children; they are detached
            // roots now and go in the next collection unless re-parented.
            for &child in component.children() {
                if let Some(node) = self.node_mut(child) {
                    node.parent = None;
                }
                self.rebase_subtree(child, Vec::new());
                self.mark_transform_changed(child);
            }
            if let Some(proxy) = component.mesh().and_then(MeshRenderer::proxy) {
                self.orphaned_proxies.push(proxy);
            }
            debug!(component = %component_id, name = %component.name, "destroyed component");
            report.components += 1;
            return;
        }

        if self.materials.remove(&MaterialId(object)).is_some() {
            report.materials += 1;
        }
    }
}
