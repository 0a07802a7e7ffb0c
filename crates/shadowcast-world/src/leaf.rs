//! Boundary polygons of the solid leaves under a BSP subtree.
//!
//! Faceless ("skip" textured) brush models have no drawable faces but still
//! occupy solid leaves. Rebuilding those leaves' walls gives them a shadow
//! silhouette.

use shadowcast_math::Plane;

use crate::winding::{Winding, ON_EPSILON};
use crate::world::{ModelId, NodeChild, World};

/// Walls of a convex region bounded by `planes`, each facing inward.
///
/// Every plane yields at most one outward-facing winding, clipped by all the
/// other planes. Planes whose winding is clipped away contribute nothing.
pub fn region_windings(planes: &[Plane]) -> Vec<Winding> {
    let mut result = Vec::new();

    for (i, plane) in planes.iter().enumerate() {
        let mut winding = Some(Winding::base_for_plane(&plane.flipped()));

        for (j, other) in planes.iter().enumerate() {
            if i == j {
                continue;
            }
            winding = match winding {
                Some(w) => w.clip_front(other, ON_EPSILON),
                None => break,
            };
        }

        match winding {
            Some(w) => result.push(w),
            None => log::debug!("leaf wall on plane {} clipped away", i),
        }
    }

    result
}

enum Step {
    Visit(NodeChild),
    PushPlane(Plane),
    PopPlane,
}

/// Walls of every solid leaf reachable from `head`.
pub fn subtree_windings(world: &World, head: NodeChild) -> Vec<Winding> {
    let mut result = Vec::new();
    let mut planes: Vec<Plane> = Vec::new();
    let mut work = vec![Step::Visit(head)];

    while let Some(step) = work.pop() {
        match step {
            Step::PushPlane(plane) => planes.push(plane),
            Step::PopPlane => {
                planes.pop();
            }
            Step::Visit(NodeChild::Leaf(leaf)) => {
                if world.format.is_solid_leaf(world.leaves[leaf].contents) {
                    result.extend(region_windings(&planes));
                }
            }
            Step::Visit(NodeChild::Node(node)) => {
                let node = &world.nodes[node];
                let plane = world.planes[node.plane];

                // Reverse order: the front side is walked first.
                work.push(Step::PopPlane);
                work.push(Step::Visit(node.children[1]));
                work.push(Step::PushPlane(plane.flipped()));
                work.push(Step::PopPlane);
                work.push(Step::Visit(node.children[0]));
                work.push(Step::PushPlane(plane));
            }
        }
    }

    debug_assert!(planes.is_empty());
    result
}

/// Walls of the solid leaves of a model's BSP tree; empty when the model has
/// no tree.
pub fn model_windings(world: &World, model: ModelId) -> Vec<Winding> {
    match world.models[model].head_node {
        Some(head) => subtree_windings(world, head),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::BspFormat;
    use crate::model::ModelInfo;
    use crate::world::{Leaf, Node};
    use approx::assert_relative_eq;
    use shadowcast_math::{Point3, Vec3};

    /// BSP of the box `[0,2]^3` (inward planes), nested so the solid leaf sits
    /// on the front side of all six splits.
    fn box_world(format: BspFormat, solid: i32, empty: i32) -> (World, NodeChild) {
        let mut world = World::new(format);
        let inward = [
            Plane::new(Vec3::x(), 0.0),
            Plane::new(-Vec3::x(), -2.0),
            Plane::new(Vec3::y(), 0.0),
            Plane::new(-Vec3::y(), -2.0),
            Plane::new(Vec3::z(), 0.0),
            Plane::new(-Vec3::z(), -2.0),
        ];

        let mut child = world.add_leaf(Leaf { contents: solid });
        for plane in inward.iter().rev() {
            let plane = world.add_plane(*plane);
            let outside = world.add_leaf(Leaf { contents: empty });
            child = world.add_node(Node {
                plane,
                children: [child, outside],
            });
        }
        (world, child)
    }

    #[test]
    fn test_box_has_six_walls() {
        let (world, head) = box_world(BspFormat::Quake, -2, -1);
        let walls = subtree_windings(&world, head);
        assert_eq!(walls.len(), 6);
        for wall in &walls {
            assert_relative_eq!(wall.area(), 4.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_walls_face_outward() {
        let (world, head) = box_world(BspFormat::Quake, -2, -1);
        let center = Point3::new(1.0, 1.0, 1.0);
        for wall in subtree_windings(&world, head) {
            let p = wall.points();
            let normal = (p[1] - p[0]).cross(&(p[2] - p[0]));
            assert!(normal.dot(&(p[0] - center)) > 0.0);
        }
    }

    #[test]
    fn test_quake2_solid_bit() {
        let (world, head) = box_world(BspFormat::Quake2, 1, 0);
        assert_eq!(subtree_windings(&world, head).len(), 6);
    }

    #[test]
    fn test_no_solid_leaves() {
        let (world, head) = box_world(BspFormat::Quake, -1, -1);
        assert!(subtree_windings(&world, head).is_empty());
    }

    #[test]
    fn test_model_windings() {
        let (mut world, head) = box_world(BspFormat::Quake, -2, -1);
        let skip = world.add_faceless_model(ModelInfo::shadow_caster(), head);
        let plain = world.add_model(ModelInfo::world(), Vec::new());
        assert_eq!(model_windings(&world, skip).len(), 6);
        assert!(model_windings(&world, plain).is_empty());
    }

    #[test]
    fn test_unbounded_region_keeps_partial_walls() {
        // A half-space has one wall: the base winding of its plane.
        let walls = region_windings(&[Plane::new(Vec3::z(), 0.0)]);
        assert_eq!(walls.len(), 1);
    }
}
