//! Per-frame dirty propagation.
//!
//! Run once per frame, in order, after gameplay mutations and before sync:
//!
//! 1. [`propagate_up`] pushes transform changes from moved nodes into all of
//!    their descendants, since a parent's movement changes a child's world
//!    placement even though the child's relative transform is unchanged.
//! 2. [`propagate_down`] walks leaves toward roots and flags the parent of
//!    every changed component, so a clean component never hides a changed
//!    descendant and sync can skip clean subtrees.
//!
//! Both passes use an explicit stack; hierarchy depth is bounded only by
//! memory.

use crate::component::{HasTransform, SceneNode};
use crate::ids::ComponentId;
use crate::world::World;

/// Upward pass. Returns the number of components it processed.
///
/// Every node whose transform changed, and every descendant of such a node,
/// becomes transform-dirty; each changed component then moves to
/// [`DirtyState::AncestorsDirtied`](crate::DirtyState::AncestorsDirtied).
pub fn propagate_up(world: &mut World) -> usize {
    let mut processed = 0;
    let mut stack: Vec<(ComponentId, bool)> = Vec::new();

    for actor_id in &world.actor_order {
        let Some(actor) = world.actors.get(actor_id) else {
            continue;
        };
        stack.extend(actor.components.iter().rev().map(|&id| (id, false)));

        while let Some((id, parent_moved)) = stack.pop() {
            let Some(component) = world.components.get_mut(&id) else {
                continue;
            };
            let mut moved = parent_moved;
            if let Some(node) = component.node_mut() {
                moved |= node.transform_dirty;
                node.transform_dirty = false;
            }
            if moved {
                component.dirty.on_transform_changed();
            }
            if component.has_changes() {
                component.dirty.on_propagated_up();
                processed += 1;
            }
            stack.extend(component.children().iter().rev().map(|&child| (child, moved)));
        }
    }
    processed
}

/// Downward pass. Returns the number of components ready for sync.
///
/// After it runs, every ancestor of a changed component is changed too.
pub fn propagate_down(world: &mut World) -> usize {
    let order = pre_order(world);
    let mut ready = 0;

    for id in order.into_iter().rev() {
        let Some(component) = world.components.get_mut(&id) else {
            continue;
        };
        if !component.has_changes() {
            continue;
        }
        component.dirty.on_propagated_down();
        ready += 1;

        let parent = component.scene_node().and_then(SceneNode::parent);
        if let Some(parent) = parent
            && let Some(parent) = world.components.get_mut(&parent)
        {
            parent.dirty.on_descendant_changed();
        }
    }
    ready
}

/// Every component reachable from an actor, parents before children.
fn pre_order(world: &World) -> Vec<ComponentId> {
    let mut order = Vec::with_capacity(world.components.len());
    let mut stack = Vec::new();
    for actor in world.actors() {
        stack.extend(actor.components.iter().rev().copied());
        while let Some(id) = stack.pop() {
            let Some(component) = world.components.get(&id) else {
                continue;
            };
            order.push(id);
            stack.extend(component.children().iter().rev().copied());
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use engine_math::{Transform, Vec3};

    use super::*;
    use crate::component::DirtyState;
    use crate::ids::ActorId;

    /// A three-level chain `root → mid → leaf` on one actor, all synced.
    fn make_chain(world: &mut World) -> (ActorId, [ComponentId; 3]) {
        let actor = world.spawn_actor("chain").unwrap();
        let root = world.create_scene_component("root", Transform::IDENTITY);
        let mid = world.create_scene_component("mid", Transform::IDENTITY);
        let leaf = world.create_scene_component("leaf", Transform::IDENTITY);
        world.attach_component(actor, root).unwrap();
        world.add_child(root, mid).unwrap();
        world.add_child(mid, leaf).unwrap();
        settle(world);
        (actor, [root, mid, leaf])
    }

    fn settle(world: &mut World) {
        propagate_up(world);
        propagate_down(world);
        for id in world.changed_components() {
            world.mark_synced(id).unwrap();
        }
    }

    fn state(world: &World, id: ComponentId) -> DirtyState {
        world.component(id).unwrap().dirty_state()
    }

    #[test]
    fn test_settled_tree_is_clean() {
        let mut world = World::new();
        let (_, ids) = make_chain(&mut world);
        for id in ids {
            assert_eq!(state(&world, id), DirtyState::Clean);
            assert!(!world.component(id).unwrap().scene_node().unwrap().is_transform_dirty());
        }
    }

    #[test]
    fn test_moving_root_dirties_descendants() {
        let mut world = World::new();
        let (_, [root, mid, leaf]) = make_chain(&mut world);
        world.set_relative_translation(root, Vec3::X).unwrap();

        assert_eq!(propagate_up(&mut world), 3);
        for id in [root, mid, leaf] {
            assert_eq!(state(&world, id), DirtyState::AncestorsDirtied);
        }
        assert_eq!(propagate_down(&mut world), 3);
        for id in [root, mid, leaf] {
            assert_eq!(state(&world, id), DirtyState::ReadyForSync);
        }
    }

    #[test]
    fn test_moving_leaf_flags_ancestors_only_after_downward_pass() {
        let mut world = World::new();
        let (_, [root, mid, leaf]) = make_chain(&mut world);
        world.set_relative_translation(leaf, Vec3::Y).unwrap();

        propagate_up(&mut world);
        assert_eq!(state(&world, root), DirtyState::Clean);
        assert_eq!(state(&world, mid), DirtyState::Clean);
        assert_eq!(state(&world, leaf), DirtyState::AncestorsDirtied);

        propagate_down(&mut world);
        for id in [root, mid, leaf] {
            assert_eq!(state(&world, id), DirtyState::ReadyForSync);
        }
    }

    #[test]
    fn test_material_change_does_not_move_children() {
        let mut world = World::new();
        let (_, [root, mid, leaf]) = make_chain(&mut world);
        world.set_visible(mid, false).unwrap();

        propagate_up(&mut world);
        assert_eq!(state(&world, mid), DirtyState::AncestorsDirtied);
        assert_eq!(state(&world, leaf), DirtyState::Clean);

        propagate_down(&mut world);
        assert_eq!(state(&world, root), DirtyState::ReadyForSync);
        assert_eq!(state(&world, leaf), DirtyState::Clean);
        assert_eq!(world.changed_components(), vec![root, mid]);
    }

    #[test]
    fn test_changed_descendant_implies_changed_ancestor() {
        let mut world = World::new();
        let actor = world.spawn_actor("wide").unwrap();
        let root = world.create_scene_component("root", Transform::IDENTITY);
        world.attach_component(actor, root).unwrap();

        // A small tree with mixed depths.
        let mut nodes = vec![root];
        for i in 1..12 {
            let parent = nodes[(i - 1) / 2];
            let node = world.create_scene_component(format!("n{i}"), Transform::IDENTITY);
            world.add_child(parent, node).unwrap();
            nodes.push(node);
        }
        settle(&mut world);

        for &changed in &[nodes[7], nodes[10]] {
            world.set_relative_scale(changed, Vec3::splat(2.0)).unwrap();
        }
        propagate_up(&mut world);
        propagate_down(&mut world);

        for &id in &nodes {
            let component = world.component(id).unwrap();
            let node = component.scene_node().unwrap();
            let any_child_changed = node
                .children()
                .iter()
                .any(|&c| world.component(c).unwrap().has_changes());
            if any_child_changed {
                assert!(component.has_changes(), "{id} should be flagged");
            }
        }
        // Untouched branches stay clean.
        assert!(!world.component(nodes[6]).unwrap().has_changes());
    }

    #[test]
    fn test_logic_components_ignored() {
        let mut world = World::new();
        let actor = world.spawn_actor("a").unwrap();
        let logic = world.create_component("brain", crate::component::ComponentKind::Logic);
        world.attach_component(actor, logic).unwrap();
        assert_eq!(propagate_up(&mut world), 0);
        assert_eq!(propagate_down(&mut world), 0);
        assert_eq!(state(&world, logic), DirtyState::Clean);
    }
}
