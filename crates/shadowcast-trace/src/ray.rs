//! Ray representation and the ray-box / ray-triangle tests used by the BVH.

use shadowcast_math::{Aabb3, Dir3, Point3, Tolerance, Vec3};

/// A ray segment in 3D space: origin, unit direction and a far distance.
///
/// The near distance is always zero; hits must lie in `(0, tfar]`.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Maximum travel distance.
    pub tfar: f64,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
    /// Sign of direction components (0 if positive, 1 if negative).
    sign: [usize; 3],
}

/// Raw ray-triangle intersection.
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray.
    pub t: f64,
    /// Barycentric coordinate of the second vertex.
    pub u: f64,
    /// Barycentric coordinate of the third vertex.
    pub v: f64,
    /// Unnormalized geometric normal, `(v1 - v0) x (v2 - v0)`.
    pub normal: Vec3,
}

impl Ray {
    /// Create an unbounded ray. The direction will be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self::segment(origin, direction, f64::INFINITY)
    }

    /// Create a ray that travels at most `tfar`. The direction will be
    /// normalized; a zero direction yields a ray that can hit nothing.
    pub fn segment(origin: Point3, direction: Vec3, tfar: f64) -> Self {
        let (dir, tfar) = match Dir3::try_new(direction, 0.0) {
            Some(dir) => (dir, tfar),
            None => (Dir3::new_unchecked(Vec3::z()), 0.0),
        };
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let sign = [
            if inv.x < 0.0 { 1 } else { 0 },
            if inv.y < 0.0 { 1 } else { 0 },
            if inv.z < 0.0 { 1 } else { 0 },
        ];
        Self {
            origin,
            direction: dir,
            tfar,
            inv_direction: inv,
            sign,
        }
    }

    /// Segment from `start` to `stop`.
    pub fn between(start: &Point3, stop: &Point3) -> Self {
        let delta = stop - start;
        Self::segment(*start, delta, delta.norm())
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Whether a hit distance lies inside this ray's `(0, tfar]` interval.
    #[inline]
    pub fn accepts(&self, t: f64) -> bool {
        t > 0.0 && t <= self.tfar
    }

    /// Test ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_min, t_max))` if the ray intersects the box,
    /// where `t_min` and `t_max` are the entry and exit parameters.
    /// Returns `None` if no intersection.
    ///
    /// Handles infinite values correctly for axis-aligned rays.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let bounds = [aabb.min, aabb.max];

        let tx1 = (bounds[self.sign[0]].x - self.origin.x) * self.inv_direction.x;
        let tx2 = (bounds[1 - self.sign[0]].x - self.origin.x) * self.inv_direction.x;

        let mut t_min = tx1;
        let mut t_max = tx2;

        let ty1 = (bounds[self.sign[1]].y - self.origin.y) * self.inv_direction.y;
        let ty2 = (bounds[1 - self.sign[1]].y - self.origin.y) * self.inv_direction.y;

        t_min = t_min.max(ty1);
        t_max = t_max.min(ty2);

        let tz1 = (bounds[self.sign[2]].z - self.origin.z) * self.inv_direction.z;
        let tz2 = (bounds[1 - self.sign[2]].z - self.origin.z) * self.inv_direction.z;

        t_min = t_min.max(tz1);
        t_max = t_max.min(tz2);

        if t_max >= t_min && t_max >= 0.0 {
            Some((t_min.max(0.0), t_max))
        } else {
            None
        }
    }

    /// Double-sided Möller-Trumbore ray-triangle test.
    ///
    /// Barycentric coordinates may overshoot the edges by
    /// `tol.barycentric` so that rays through a shared fan edge hit at
    /// least one of the two triangles. Such a ray may hit both; the scene
    /// merges them into one crossing.
    pub fn intersect_triangle(
        &self,
        v0: &Point3,
        v1: &Point3,
        v2: &Point3,
        tol: &Tolerance,
    ) -> Option<TriangleHit> {
        let e1 = v1 - v0;
        let e2 = v2 - v0;
        let dir = self.direction.as_ref();

        let pvec = dir.cross(&e2);
        let det = e1.dot(&pvec);
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = self.origin - v0;
        let u = tvec.dot(&pvec) * inv_det;
        let eps = tol.barycentric;
        if u < -eps || u > 1.0 + eps {
            return None;
        }

        let qvec = tvec.cross(&e1);
        let v = dir.dot(&qvec) * inv_det;
        if v < -eps || u + v > 1.0 + eps {
            return None;
        }

        let t = e2.dot(&qvec) * inv_det;
        Some(TriangleHit {
            t,
            u,
            v,
            normal: e1.cross(&e2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let p = ray.at(5.0);
        assert!((p.x - 5.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
        assert!(p.z.abs() < 1e-12);
    }

    #[test]
    fn test_between() {
        let ray = Ray::between(&Point3::new(0.0, 0.0, 10.0), &Point3::new(0.0, 0.0, -10.0));
        assert!((ray.tfar - 20.0).abs() < 1e-12);
        assert!((ray.direction.z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_direction_hits_nothing() {
        let ray = Ray::between(&Point3::new(1.0, 1.0, 1.0), &Point3::new(1.0, 1.0, 1.0));
        assert_eq!(ray.tfar, 0.0);
        assert!(!ray.accepts(0.0));
        assert!(!ray.accepts(1e-9));
    }

    #[test]
    fn test_ray_aabb_hit() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let (t_min, t_max) = ray.intersect_aabb(&aabb).unwrap();
        assert!((t_min - 5.0).abs() < 1e-10);
        assert!((t_max - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_ray_aabb_miss() {
        let ray = Ray::new(Point3::new(-5.0, 5.0, 5.0), Vec3::new(1.0, 0.0, 0.0));
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        assert!(ray.intersect_aabb(&aabb).is_none());
    }

    #[test]
    fn test_ray_aabb_flat_box() {
        // Zero-thickness boxes enclose planar geometry.
        let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let aabb = Aabb3::new(Point3::new(-5.0, -5.0, 0.0), Point3::new(5.0, 5.0, 0.0));
        let (t_min, _) = ray.intersect_aabb(&aabb).unwrap();
        assert!((t_min - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_ray_aabb_behind() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        assert!(ray.intersect_aabb(&aabb).is_none());
    }

    #[test]
    fn test_triangle_hit_and_normal() {
        let tol = Tolerance::DEFAULT;
        let ray = Ray::new(Point3::new(0.2, 0.2, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = ray
            .intersect_triangle(
                &Point3::new(0.0, 0.0, 0.0),
                &Point3::new(1.0, 0.0, 0.0),
                &Point3::new(0.0, 1.0, 0.0),
                &tol,
            )
            .unwrap();
        assert!((hit.t - 5.0).abs() < 1e-12);
        assert!((hit.u - 0.2).abs() < 1e-12);
        assert!((hit.v - 0.2).abs() < 1e-12);
        assert!(hit.normal.z > 0.0);
    }

    #[test]
    fn test_triangle_double_sided() {
        let tol = Tolerance::DEFAULT;
        let ray = Ray::new(Point3::new(0.2, 0.2, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = ray.intersect_triangle(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
            &tol,
        );
        assert!(hit.is_some());
    }

    #[test]
    fn test_triangle_miss() {
        let tol = Tolerance::DEFAULT;
        let ray = Ray::new(Point3::new(0.8, 0.8, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = ray.intersect_triangle(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
            &tol,
        );
        assert!(hit.is_none());
    }
}
