//! Spatial-query backend: triangle meshes behind per-geometry BVHs.
//!
//! A [`SceneBuilder`] accepts meshes and filter registrations, then
//! [`SceneBuilder::commit`] freezes it into a [`Scene`] that can only be
//! queried. Hits on filtered geometry are handed to a caller-supplied
//! callback that accepts or rejects each one; hits on unfiltered geometry
//! are always accepted.

use shadowcast_math::{Point3, Tolerance, Vec3};

use crate::bvh::Bvh;
use crate::ray::Ray;

/// Identifier of a geometry inside a [`Scene`].
pub type GeomId = u32;

/// Backend feature switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneConfig {
    /// Per-ray visibility masks. The shadow policy routes rays through an
    /// explicit context instead, so this must stay off.
    pub ray_mask: bool,
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex indices, three per triangle.
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Corner positions of triangle `tri`.
    pub fn triangle(&self, tri: u32) -> [Point3; 3] {
        let [a, b, c] = self.triangles[tri as usize];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }
}

/// A ray-triangle intersection reported by the backend.
#[derive(Debug, Clone, Copy)]
pub struct CandidateHit {
    /// Geometry that was hit.
    pub geom: GeomId,
    /// Triangle index within the geometry.
    pub prim: u32,
    /// Distance along the ray.
    pub t: f64,
    /// Barycentric U.
    pub u: f64,
    /// Barycentric V.
    pub v: f64,
    /// Unnormalized geometric normal of the triangle.
    pub normal: Vec3,
}

struct Geometry {
    mesh: TriangleMesh,
    bvh: Bvh,
    filtered: bool,
}

/// Mutable scene under construction.
pub struct SceneBuilder {
    config: SceneConfig,
    leaf_size: usize,
    meshes: Vec<(TriangleMesh, bool)>,
}

impl SceneBuilder {
    /// Start an empty scene.
    pub fn new(config: SceneConfig, leaf_size: usize) -> Self {
        Self {
            config,
            leaf_size,
            meshes: Vec::new(),
        }
    }

    /// Backend configuration.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Append a triangle mesh and return its geometry id.
    pub fn add_triangle_mesh(&mut self, mesh: TriangleMesh) -> GeomId {
        self.meshes.push((mesh, false));
        (self.meshes.len() - 1) as GeomId
    }

    /// Route every hit on `geom` through the query's filter callback.
    pub fn set_filter(&mut self, geom: GeomId) {
        match self.meshes.get_mut(geom as usize) {
            Some((_, filtered)) => *filtered = true,
            None => panic!("set_filter on unknown geometry {}", geom),
        }
    }

    /// Build acceleration structures and freeze the scene.
    pub fn commit(self) -> Scene {
        let leaf_size = self.leaf_size;
        let geometries = self
            .meshes
            .into_iter()
            .map(|(mesh, filtered)| Geometry {
                bvh: Bvh::build(&mesh, leaf_size),
                mesh,
                filtered,
            })
            .collect();
        Scene {
            config: self.config,
            geometries,
            tolerance: Tolerance::DEFAULT,
        }
    }
}

/// Frozen, query-only scene. Shared read-only between threads.
pub struct Scene {
    config: SceneConfig,
    geometries: Vec<Geometry>,
    tolerance: Tolerance,
}

impl Scene {
    /// Backend configuration the scene was built with.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Number of geometries.
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Mesh of `geom`. Panics on an unknown id.
    pub fn mesh(&self, geom: GeomId) -> &TriangleMesh {
        &self.geometry(geom).mesh
    }

    /// Whether hits on `geom` go through the filter callback.
    pub fn is_filtered(&self, geom: GeomId) -> bool {
        self.geometry(geom).filtered
    }

    fn geometry(&self, geom: GeomId) -> &Geometry {
        self.geometries
            .get(geom as usize)
            .unwrap_or_else(|| panic!("unknown geometry {}", geom))
    }

    fn candidate(&self, ray: &Ray, geom: usize, prim: u32) -> Option<CandidateHit> {
        let [a, b, c] = self.geometries[geom].mesh.triangle(prim);
        let hit = ray.intersect_triangle(&a, &b, &c, &self.tolerance)?;
        ray.accepts(hit.t).then_some(CandidateHit {
            geom: geom as GeomId,
            prim,
            t: hit.t,
            u: hit.u,
            v: hit.v,
            normal: hit.normal,
        })
    }

    /// Hits in `(0, tfar]` on geometries selected by `include`, sorted by
    /// distance, one per surface crossing.
    fn gather(
        &self,
        ray: &Ray,
        out: &mut Vec<CandidateHit>,
        include: impl Fn(&Geometry) -> bool,
    ) {
        out.clear();
        for (geom, geometry) in self.geometries.iter().enumerate() {
            if !include(geometry) {
                continue;
            }
            geometry.bvh.visit(ray, |prim| {
                if let Some(hit) = self.candidate(ray, geom, prim) {
                    out.push(hit);
                }
            });
        }
        out.sort_by(|a, b| a.t.total_cmp(&b.t));
        self.merge_shared_edges(out);
    }

    /// Collapse hits where the ray crosses an edge or vertex shared by
    /// coplanar triangles of one geometry. Expects `hits` sorted by `t`.
    fn merge_shared_edges(&self, hits: &mut Vec<CandidateHit>) {
        let eps = self.tolerance.linear;
        let mut kept = 0;
        for i in 0..hits.len() {
            let hit = hits[i];
            let duplicate = hits[..kept]
                .iter()
                .rev()
                .take_while(|prev| hit.t - prev.t <= eps)
                .any(|prev| prev.geom == hit.geom && coplanar(&prev.normal, &hit.normal));
            if !duplicate {
                hits[kept] = hit;
                kept += 1;
            }
        }
        hits.truncate(kept);
    }

    /// Any-hit query. Returns an accepted blocker, if there is one.
    ///
    /// The first unfiltered hit found blocks without consulting `filter`.
    /// Otherwise filtered candidates are offered front to back until one is
    /// accepted.
    pub fn occluded(
        &self,
        ray: &Ray,
        scratch: &mut Vec<CandidateHit>,
        mut filter: impl FnMut(&CandidateHit) -> bool,
    ) -> Option<CandidateHit> {
        let mut blocker = None;
        for (geom, geometry) in self.geometries.iter().enumerate() {
            if geometry.filtered {
                continue;
            }
            let found = geometry.bvh.any(ray, |prim| {
                blocker = self.candidate(ray, geom, prim);
                blocker.is_some()
            });
            if found {
                return blocker;
            }
        }

        self.gather(ray, scratch, |geometry| geometry.filtered);
        scratch.iter().find(|&hit| filter(hit)).copied()
    }

    /// Nearest accepted hit. Candidates are offered front to back; filtered
    /// ones go through `filter`.
    pub fn intersect(
        &self,
        ray: &Ray,
        scratch: &mut Vec<CandidateHit>,
        mut filter: impl FnMut(&CandidateHit) -> bool,
    ) -> Option<CandidateHit> {
        self.gather(ray, scratch, |_| true);
        scratch
            .iter()
            .find(|&hit| !self.geometries[hit.geom as usize].filtered || filter(hit))
            .copied()
    }

    /// [`Scene::occluded`] over a slice of rays. The filter receives the
    /// ray's index in `rays`.
    pub fn occluded_stream(
        &self,
        rays: &[Ray],
        scratch: &mut Vec<CandidateHit>,
        out: &mut [Option<CandidateHit>],
        mut filter: impl FnMut(usize, &CandidateHit) -> bool,
    ) {
        assert!(out.len() >= rays.len(), "stream output shorter than input");
        for (i, ray) in rays.iter().enumerate() {
            out[i] = self.occluded(ray, scratch, |hit| filter(i, hit));
        }
    }

    /// [`Scene::intersect`] over a slice of rays. The filter receives the
    /// ray's index in `rays`.
    pub fn intersect_stream(
        &self,
        rays: &[Ray],
        scratch: &mut Vec<CandidateHit>,
        out: &mut [Option<CandidateHit>],
        mut filter: impl FnMut(usize, &CandidateHit) -> bool,
    ) {
        assert!(out.len() >= rays.len(), "stream output shorter than input");
        for (i, ray) in rays.iter().enumerate() {
            out[i] = self.intersect(ray, scratch, |hit| filter(i, hit));
        }
    }
}

/// Whether two triangle normals are parallel and point the same way.
fn coplanar(a: &Vec3, b: &Vec3) -> bool {
    a.dot(b) > 0.0 && a.cross(b).norm() <= 1e-9 * a.norm() * b.norm()
}
