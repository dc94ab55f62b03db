//! Components and their kinds.
//!
//! Every component is a [`Component`] record in the world arena. What it can
//! do is decided by its [`ComponentKind`], a closed set:
//!
//! | Kind    | Spatial | Renderable |
//! |---------|---------|------------|
//! | `Logic` | no      | no         |
//! | `Scene` | yes     | no         |
//! | `Mesh`  | yes     | yes        |
//!
//! Callers ask for capabilities explicitly through [`HasTransform`] and
//! [`HasMaterials`], and typed name lookups filter with a [`ComponentClass`]
//! marker instead of inspecting runtime types.

use engine_math::{Aabb, Transform};

use crate::ids::{ActorId, ComponentId, MaterialId, ProxyId};

// ── Dirty state ─────────────────────────────────────────────────────────────

/// Per-frame synchronisation state of a component.
///
/// ```text
/// Clean ─(mutation)─► TransformDirty / MaterialDirty
///       ─(propagate_up)─► AncestorsDirtied
///       ─(propagate_down)─► ReadyForSync
///       ─(sync)─► Clean
/// ```
///
/// A second mutation in the same frame leaves the state where it is; the
/// sync step reads the current values, so several changes collapse into one
/// proxy update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DirtyState {
    /// Matches what was last pushed to the proxy.
    #[default]
    Clean,
    /// The relative transform (or the inherited world transform) changed.
    TransformDirty,
    /// Materials or visibility changed.
    MaterialDirty,
    /// The upward pass has processed this component.
    AncestorsDirtied,
    /// The downward pass has processed this component; the sync step will
    /// visit it.
    ReadyForSync,
}

impl DirtyState {
    /// Returns `true` unless the state is [`DirtyState::Clean`].
    #[must_use]
    pub const fn has_changes(self) -> bool {
        !matches!(self, Self::Clean)
    }

    pub(crate) fn on_transform_changed(&mut self) {
        if matches!(self, Self::Clean | Self::MaterialDirty) {
            *self = Self::TransformDirty;
        }
    }

    pub(crate) fn on_material_changed(&mut self) {
        if matches!(self, Self::Clean) {
            *self = Self::MaterialDirty;
        }
    }

    pub(crate) fn on_propagated_up(&mut self) {
        if matches!(self, Self::TransformDirty | Self::MaterialDirty) {
            *self = Self::AncestorsDirtied;
        }
    }

    pub(crate) fn on_propagated_down(&mut self) {
        if self.has_changes() {
            *self = Self::ReadyForSync;
        }
    }

    pub(crate) fn on_descendant_changed(&mut self) {
        *self = Self::ReadyForSync;
    }
}

// ── Kinds ───────────────────────────────────────────────────────────────────

/// Reference to geometry owned by the asset layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeometryRef(pub String);

impl GeometryRef {
    /// Create a geometry reference from an asset key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

/// Spatial placement of a scene component.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) parent: Option<ComponentId>,
    pub(crate) children: Vec<ComponentId>,
    /// Root-to-parent chain, always consistent with `parent`.
    pub(crate) ancestors: Vec<ComponentId>,
    pub(crate) transform: Transform,
    /// Set by transform setters, cleared by the upward pass.
    pub(crate) transform_dirty: bool,
    pub(crate) visible: bool,
    pub(crate) local_bounds: Aabb,
    pub(crate) world_bounds: Aabb,
}

impl SceneNode {
    /// Create an unparented node with the given relative transform.
    #[must_use]
    pub fn new(transform: Transform) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            ancestors: Vec::new(),
            transform,
            transform_dirty: true,
            visible: true,
            local_bounds: Aabb::ZERO,
            world_bounds: Aabb::ZERO,
        }
    }

    /// Set the local bounding box.
    #[must_use]
    pub fn with_bounds(mut self, local_bounds: Aabb) -> Self {
        self.local_bounds = local_bounds;
        self
    }

    /// Returns the parent component, or `None` if this node sits directly
    /// under its actor (or is detached).
    #[must_use]
    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    /// Returns the child components in insertion order.
    #[must_use]
    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    /// Returns the ancestor chain, root first, ending with the parent.
    #[must_use]
    pub fn ancestors(&self) -> &[ComponentId] {
        &self.ancestors
    }

    /// Returns the relative transform.
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Returns `true` if the transform changed since the last upward pass.
    #[must_use]
    pub fn is_transform_dirty(&self) -> bool {
        self.transform_dirty
    }

    /// Returns the visibility flag.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns the local bounding box.
    #[must_use]
    pub fn local_bounds(&self) -> &Aabb {
        &self.local_bounds
    }

    /// Returns the world bounding box from the last
    /// [`World::world_bounds`](crate::World::world_bounds) call.
    #[must_use]
    pub fn cached_world_bounds(&self) -> &Aabb {
        &self.world_bounds
    }
}

/// Render data of a mesh component.
#[derive(Debug, Clone)]
pub struct MeshRenderer {
    pub(crate) geometry: GeometryRef,
    pub(crate) materials: Vec<MaterialId>,
    /// Bound on first sync; cleared when the proxy is orphaned.
    pub(crate) proxy: Option<ProxyId>,
}

impl MeshRenderer {
    /// Create a mesh renderer with no materials.
    #[must_use]
    pub fn new(geometry: GeometryRef) -> Self {
        Self {
            geometry,
            materials: Vec::new(),
            proxy: None,
        }
    }

    /// Returns the geometry reference.
    #[must_use]
    pub fn geometry(&self) -> &GeometryRef {
        &self.geometry
    }

    /// Returns the proxy bound to this mesh, if it has been synced.
    #[must_use]
    pub fn proxy(&self) -> Option<ProxyId> {
        self.proxy
    }
}

/// The closed set of component kinds.
#[derive(Debug, Clone)]
pub enum ComponentKind {
    /// Behaviour or data with no spatial placement.
    Logic,
    /// A component with a place in the spatial hierarchy.
    Scene(SceneNode),
    /// A spatial component that is mirrored by a renderer proxy.
    Mesh {
        /// Spatial placement.
        node: SceneNode,
        /// Render data.
        mesh: MeshRenderer,
    },
}

impl ComponentKind {
    /// A scene component with the given relative transform.
    #[must_use]
    pub fn scene(transform: Transform) -> Self {
        Self::Scene(SceneNode::new(transform))
    }

    /// A mesh component with the given relative transform, geometry and
    /// local bounds.
    #[must_use]
    pub fn mesh(transform: Transform, geometry: GeometryRef, local_bounds: Aabb) -> Self {
        Self::Mesh {
            node: SceneNode::new(transform).with_bounds(local_bounds),
            mesh: MeshRenderer::new(geometry),
        }
    }

    /// Returns the kind's name, for logging.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Logic => "logic",
            Self::Scene(_) => "scene",
            Self::Mesh { .. } => "mesh",
        }
    }
}

// ── Component ───────────────────────────────────────────────────────────────

/// A component record in the world arena.
#[derive(Debug, Clone)]
pub struct Component {
    pub(crate) id: ComponentId,
    pub(crate) name: String,
    /// Owning actor. Set on attach (for the whole subtree), cleared on detach.
    pub(crate) owner: Option<ActorId>,
    pub(crate) dirty: DirtyState,
    pub(crate) kind: ComponentKind,
}

impl Component {
    pub(crate) fn new(id: ComponentId, name: String, kind: ComponentKind) -> Self {
        // Spatial components start dirty so their first sync pushes them.
        let dirty = match kind {
            ComponentKind::Logic => DirtyState::Clean,
            ComponentKind::Scene(_) | ComponentKind::Mesh { .. } => DirtyState::TransformDirty,
        };
        Self {
            id,
            name,
            owner: None,
            dirty,
            kind,
        }
    }

    /// Returns the component's handle.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Returns the component's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning actor.
    #[must_use]
    pub fn owner(&self) -> Option<ActorId> {
        self.owner
    }

    /// Returns the current dirty state.
    #[must_use]
    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    /// Returns `true` if the component diverges from its last synced state.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.dirty.has_changes()
    }

    /// Returns the component's kind.
    #[must_use]
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Returns the mesh render data, if this is a mesh component.
    #[must_use]
    pub fn mesh(&self) -> Option<&MeshRenderer> {
        match &self.kind {
            ComponentKind::Mesh { mesh, .. } => Some(mesh),
            _ => None,
        }
    }

    pub(crate) fn mesh_mut(&mut self) -> Option<&mut MeshRenderer> {
        match &mut self.kind {
            ComponentKind::Mesh { mesh, .. } => Some(mesh),
            _ => None,
        }
    }

    pub(crate) fn node_mut(&mut self) -> Option<&mut SceneNode> {
        match &mut self.kind {
            ComponentKind::Scene(node) | ComponentKind::Mesh { node, .. } => Some(node),
            ComponentKind::Logic => None,
        }
    }

    /// Child components; empty for non-spatial components.
    pub(crate) fn children(&self) -> &[ComponentId] {
        self.scene_node()
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }
}

// ── Capabilities ────────────────────────────────────────────────────────────

/// Components with a place in the spatial hierarchy.
pub trait HasTransform {
    /// Returns the spatial node, or `None` if the component is not spatial.
    fn scene_node(&self) -> Option<&SceneNode>;

    /// Returns `true` if the component is spatial.
    fn is_spatial(&self) -> bool {
        self.scene_node().is_some()
    }
}

/// Components that carry materials.
pub trait HasMaterials {
    /// Returns the materials in slot order, or `None` if the component cannot
    /// carry materials.
    fn materials(&self) -> Option<&[MaterialId]>;
}

impl HasTransform for Component {
    fn scene_node(&self) -> Option<&SceneNode> {
        match &self.kind {
            ComponentKind::Scene(node) | ComponentKind::Mesh { node, .. } => Some(node),
            ComponentKind::Logic => None,
        }
    }
}

impl HasMaterials for Component {
    fn materials(&self) -> Option<&[MaterialId]> {
        self.mesh().map(|mesh| mesh.materials.as_slice())
    }
}

// ── Typed lookup ────────────────────────────────────────────────────────────

/// A class of components that typed lookups can filter by.
///
/// A kind is *assignable* to a class when [`ComponentClass::accepts`] returns
/// `true`; mesh components are assignable to [`SceneComponent`] just as they
/// are to [`MeshComponent`].
pub trait ComponentClass {
    /// Returns `true` if a component of `kind` belongs to this class.
    fn accepts(kind: &ComponentKind) -> bool;
}

/// Every component.
#[derive(Debug, Clone, Copy)]
pub struct AnyComponent;

/// Components with spatial placement (scene and mesh kinds).
#[derive(Debug, Clone, Copy)]
pub struct SceneComponent;

/// Renderable components.
#[derive(Debug, Clone, Copy)]
pub struct MeshComponent;

impl ComponentClass for AnyComponent {
    fn accepts(_kind: &ComponentKind) -> bool {
        true
    }
}

impl ComponentClass for SceneComponent {
    fn accepts(kind: &ComponentKind) -> bool {
        matches!(kind, ComponentKind::Scene(_) | ComponentKind::Mesh { .. })
    }
}

impl ComponentClass for MeshComponent {
    fn accepts(kind: &ComponentKind) -> bool {
        matches!(kind, ComponentKind::Mesh { .. })
    }
}
