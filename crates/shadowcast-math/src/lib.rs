#![warn(missing_docs)]

//! Math types for the shadowcast visibility engine.
//!
//! Thin wrappers around nalgebra providing the handful of domain types the
//! world model and the tracer share: points, vectors, directions, RGB
//! colors, planes, bounding boxes and tolerance constants.

use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A linear RGB color with components in `[0, 1]`.
pub type Color3 = Vector3<f64>;

/// An oriented plane: the set of points `p` with `normal · p = dist`.
///
/// The normal points to the plane's front side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Distance from the origin along `normal`.
    pub dist: f64,
}

impl Plane {
    /// Create a plane from a normal and distance. The normal is normalized.
    pub fn new(normal: Vec3, dist: f64) -> Self {
        let len = normal.norm();
        if len > 0.0 {
            Self {
                normal: normal / len,
                dist: dist / len,
            }
        } else {
            Self { normal, dist }
        }
    }

    /// Plane through `point` with the given normal.
    pub fn from_point_normal(point: &Point3, normal: Vec3) -> Self {
        let n = normal.normalize();
        Self {
            normal: n,
            dist: n.dot(&point.coords),
        }
    }

    /// The same plane facing the other way.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            dist: -self.dist,
        }
    }

    /// Signed distance from `p` to the plane (positive on the front side).
    #[inline]
    pub fn distance_to(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.dist
    }
}

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this AABB to include another box.
    pub fn include_aabb(&mut self, other: &Aabb3) {
        self.include_point(&other.min);
        self.include_point(&other.max);
    }

    /// True if no point was ever included.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Center point.
    pub fn centroid(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Surface area, used by the SAH split cost.
    pub fn surface_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in world units.
    pub linear: f64,
    /// Slack allowed on barycentric coordinates at triangle edges.
    pub barycentric: f64,
}

impl Tolerance {
    /// Default tolerances: 1e-6 linear, 1e-9 barycentric.
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        barycentric: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_new_normalizes() {
        let p = Plane::new(Vec3::new(0.0, 0.0, 2.0), 4.0);
        assert!((p.normal.z - 1.0).abs() < 1e-12);
        assert!((p.dist - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_plane_distance_and_flip() {
        let p = Plane::new(Vec3::z(), 1.0);
        let q = Point3::new(3.0, -2.0, 5.0);
        assert!((p.distance_to(&q) - 4.0).abs() < 1e-12);
        assert!((p.flipped().distance_to(&q) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_plane_from_point_normal() {
        let p = Plane::from_point_normal(&Point3::new(0.0, 0.0, 7.0), Vec3::new(0.0, 0.0, -3.0));
        assert!((p.normal.z + 1.0).abs() < 1e-12);
        assert!((p.dist + 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_aabb_include_and_area() {
        let mut b = Aabb3::empty();
        assert!(b.is_empty());
        assert_eq!(b.surface_area(), 0.0);
        b.include_point(&Point3::new(0.0, 0.0, 0.0));
        b.include_point(&Point3::new(1.0, 2.0, 3.0));
        assert!(!b.is_empty());
        assert!((b.surface_area() - 22.0).abs() < 1e-12);
        let c = b.centroid();
        assert!((c.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0 + 1e-7, 2.0, 3.0);
        assert!(tol.points_equal(&a, &b));
        let c = Point3::new(1.001, 2.0, 3.0);
        assert!(!tol.points_equal(&a, &c));
        assert!(tol.is_zero(5e-7));
    }
}
