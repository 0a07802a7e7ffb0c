//! Bounding Volume Hierarchy over the triangles of one mesh.
//!
//! Uses Surface Area Heuristic (SAH) for construction.

use shadowcast_math::{Aabb3, Point3};

use crate::ray::Ray;
use crate::scene::TriangleMesh;

/// A BVH node - either a leaf containing triangles or an internal node with children.
#[derive(Debug, Clone)]
pub enum BvhNode {
    /// Leaf node containing triangle indices.
    Leaf {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Triangle indices contained in this leaf.
        triangles: Vec<u32>,
    },
    /// Internal node with two children.
    Internal {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Left child node.
        left: Box<BvhNode>,
        /// Right child node.
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn aabb(&self) -> &Aabb3 {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

/// Bounding Volume Hierarchy for accelerated ray-triangle queries.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Option<BvhNode>,
    leaf_size: usize,
}

type Primitive = (u32, Aabb3, Point3);

impl Bvh {
    /// Build a BVH over every triangle of `mesh`. Leaves hold at most
    /// `leaf_size` triangles unless they cannot be split.
    pub fn build(mesh: &TriangleMesh, leaf_size: usize) -> Self {
        let leaf_size = leaf_size.max(1);
        let mut prims: Vec<Primitive> = (0..mesh.triangle_count() as u32)
            .map(|tri| {
                let mut aabb = Aabb3::empty();
                for p in mesh.triangle(tri) {
                    aabb.include_point(&p);
                }
                (tri, aabb, aabb.centroid())
            })
            .collect();

        let root = if prims.is_empty() {
            None
        } else {
            Some(build_node(&mut prims, leaf_size))
        };

        Self { root, leaf_size }
    }

    /// Call `visit` with every triangle whose leaf box the ray crosses
    /// within `(0, ray.tfar]`.
    pub fn visit(&self, ray: &Ray, mut visit: impl FnMut(u32)) {
        self.any(ray, |tri| {
            visit(tri);
            false
        });
    }

    /// Like [`Bvh::visit`], but stops at the first triangle for which
    /// `found` returns true. Returns whether that happened.
    pub fn any(&self, ray: &Ray, mut found: impl FnMut(u32) -> bool) -> bool {
        match self.root {
            Some(ref root) => walk_node(ray, root, &mut found),
            None => false,
        }
    }

    /// Get a reference to the root node, if any.
    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// Maximum triangles per leaf requested at build time.
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }
}

fn walk_node(ray: &Ray, node: &BvhNode, found: &mut impl FnMut(u32) -> bool) -> bool {
    match ray.intersect_aabb(node.aabb()) {
        Some((t_min, _)) if t_min <= ray.tfar => {}
        _ => return false,
    }

    match node {
        BvhNode::Leaf { triangles, .. } => triangles.iter().any(|&tri| found(tri)),
        BvhNode::Internal { left, right, .. } => {
            walk_node(ray, left, found) || walk_node(ray, right, found)
        }
    }
}

/// Build a BVH node recursively using SAH.
fn build_node(prims: &mut [Primitive], leaf_size: usize) -> BvhNode {
    let mut bounds = Aabb3::empty();
    for (_, aabb, _) in prims.iter() {
        bounds.include_aabb(aabb);
    }

    if prims.len() <= leaf_size {
        return BvhNode::Leaf {
            aabb: bounds,
            triangles: prims.iter().map(|(id, _, _)| *id).collect(),
        };
    }

    let mid = match find_best_split(prims, &bounds) {
        Some((axis, pos)) => partition(prims, axis, pos),
        None => 0,
    };

    // Degenerate split: fall back to halving the list.
    let mid = if mid == 0 || mid == prims.len() {
        prims.len() / 2
    } else {
        mid
    };

    let (left, right) = prims.split_at_mut(mid);
    BvhNode::Internal {
        aabb: bounds,
        left: Box::new(build_node(left, leaf_size)),
        right: Box::new(build_node(right, leaf_size)),
    }
}

/// Find the best split axis and position using SAH.
fn find_best_split(prims: &[Primitive], bounds: &Aabb3) -> Option<(usize, f64)> {
    const NUM_BUCKETS: usize = 12;
    const TRAVERSAL_COST: f64 = 0.125;

    let extent = bounds.max - bounds.min;
    let total_area = bounds.surface_area();
    if total_area <= 0.0 {
        return None;
    }

    let mut best: Option<(f64, usize, f64)> = None;

    for axis in 0..3 {
        let axis_extent = extent[axis];
        if axis_extent < 1e-10 {
            continue;
        }
        let axis_min = bounds.min[axis];

        let mut counts = [0usize; NUM_BUCKETS];
        let mut boxes = [Aabb3::empty(); NUM_BUCKETS];

        for (_, aabb, centroid) in prims {
            let b = ((centroid[axis] - axis_min) / axis_extent * NUM_BUCKETS as f64) as usize;
            let b = b.min(NUM_BUCKETS - 1);
            counts[b] += 1;
            boxes[b].include_aabb(aabb);
        }

        for split in 1..NUM_BUCKETS {
            let mut left_count = 0;
            let mut left_bounds = Aabb3::empty();
            for i in 0..split {
                left_count += counts[i];
                if counts[i] > 0 {
                    left_bounds.include_aabb(&boxes[i]);
                }
            }

            let mut right_count = 0;
            let mut right_bounds = Aabb3::empty();
            for i in split..NUM_BUCKETS {
                right_count += counts[i];
                if counts[i] > 0 {
                    right_bounds.include_aabb(&boxes[i]);
                }
            }

            if left_count == 0 || right_count == 0 {
                continue;
            }

            let cost = TRAVERSAL_COST
                + left_bounds.surface_area() / total_area * left_count as f64
                + right_bounds.surface_area() / total_area * right_count as f64;

            if best.map_or(true, |(c, _, _)| cost < c) {
                let pos = axis_min + (split as f64 / NUM_BUCKETS as f64) * axis_extent;
                best = Some((cost, axis, pos));
            }
        }
    }

    best.map(|(_, axis, pos)| (axis, pos))
}

/// Partition primitives by centroid along an axis.
fn partition(prims: &mut [Primitive], axis: usize, pos: f64) -> usize {
    let mut left = 0;
    let mut right = prims.len();

    while left < right {
        if prims[left].2[axis] < pos {
            left += 1;
        } else {
            right -= 1;
            prims.swap(left, right);
        }
    }

    left
}
