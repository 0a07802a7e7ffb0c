//! Convex polygon windings and plane clipping.

use shadowcast_math::{Plane, Point3, Vec3};

/// Half-extent of the initial winding built on a plane; larger than any
/// playable world.
pub const BOGUS_RANGE: f64 = 65536.0;

/// Points closer than this to a clip plane count as lying on it.
pub const ON_EPSILON: f64 = 0.1;

/// A convex planar polygon, counter-clockwise about its plane normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Winding {
    points: Vec<Point3>,
}

#[derive(Clone, Copy, PartialEq)]
enum Side {
    Front,
    Back,
    On,
}

impl Winding {
    /// Wrap a point list. The caller guarantees convexity and planarity.
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// A huge square lying on `plane`, counter-clockwise about its normal.
    pub fn base_for_plane(plane: &Plane) -> Self {
        let n = plane.normal;

        // Pick the world axis least aligned with the normal as "up".
        let ax = n.x.abs();
        let ay = n.y.abs();
        let az = n.z.abs();
        let up = if az >= ax && az >= ay {
            Vec3::x()
        } else {
            Vec3::z()
        };

        let u = (up - n * up.dot(&n)).normalize();
        let v = n.cross(&u);
        let origin = Point3::from(n * plane.dist);

        let u = u * BOGUS_RANGE;
        let v = v * BOGUS_RANGE;
        Self {
            points: vec![
                origin - u - v,
                origin + u - v,
                origin + u + v,
                origin - u + v,
            ],
        }
    }

    /// The polygon's vertices.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the winding has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Area of the polygon.
    pub fn area(&self) -> f64 {
        let Some(&first) = self.points.first() else {
            return 0.0;
        };
        let mut total = 0.0;
        for pair in self.points[1..].windows(2) {
            total += 0.5 * (pair[0] - first).cross(&(pair[1] - first)).norm();
        }
        total
    }

    /// Keep the part of the winding in front of `plane`.
    ///
    /// Returns `None` when nothing remains. Points within `epsilon` of the
    /// plane are kept on both sides.
    pub fn clip_front(&self, plane: &Plane, epsilon: f64) -> Option<Winding> {
        let dists: Vec<f64> = self.points.iter().map(|p| plane.distance_to(p)).collect();
        let sides: Vec<Side> = dists
            .iter()
            .map(|&d| {
                if d > epsilon {
                    Side::Front
                } else if d < -epsilon {
                    Side::Back
                } else {
                    Side::On
                }
            })
            .collect();

        let has_front = sides.iter().any(|&s| s == Side::Front);
        let has_back = sides.iter().any(|&s| s == Side::Back);
        if !has_front {
            // Entirely behind, or coplanar.
            return None;
        }
        if !has_back {
            return Some(self.clone());
        }

        let n = self.points.len();
        let mut out = Vec::with_capacity(n + 4);
        for i in 0..n {
            let p = self.points[i];
            match sides[i] {
                Side::On => {
                    out.push(p);
                    continue;
                }
                Side::Front => out.push(p),
                Side::Back => {}
            }

            let j = (i + 1) % n;
            if sides[j] == Side::On || sides[j] == sides[i] {
                continue;
            }

            let t = dists[i] / (dists[i] - dists[j]);
            let q = self.points[j];
            let mut mid = p + (q - p) * t;
            // Snap exactly onto axial planes.
            for axis in 0..3 {
                if plane.normal[axis] == 1.0 {
                    mid[axis] = plane.dist;
                } else if plane.normal[axis] == -1.0 {
                    mid[axis] = -plane.dist;
                }
            }
            out.push(mid);
        }

        if out.len() < 3 {
            None
        } else {
            Some(Winding { points: out })
        }
    }
}
