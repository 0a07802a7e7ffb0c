//! Fan triangulation of faces and windings into scene meshes, keeping a
//! back-reference from every triangle to its face and model.

use shadowcast_math::Point3;
use shadowcast_world::{FaceId, ModelId, Winding, World};

use crate::classify::OcclusionClass;
use crate::scene::{GeomId, SceneBuilder, TriangleMesh};

/// What a scene group was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Faces of one occlusion class.
    Faces(OcclusionClass),
    /// Leaf-boundary windings of faceless models; occludes like solid.
    Skip,
}

/// Triangle ownership of one mesh registered in the scene.
#[derive(Debug, Clone)]
pub struct SceneGroup {
    /// Source of the group's triangles.
    pub kind: GroupKind,
    /// Geometry id in the scene.
    pub geom: GeomId,
    tri_face: Vec<Option<FaceId>>,
    tri_model: Vec<Option<ModelId>>,
}

impl SceneGroup {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.tri_face.len()
    }

    /// Face that produced triangle `prim`; `None` for winding triangles.
    pub fn face(&self, prim: u32) -> Option<FaceId> {
        self.tri_face[prim as usize]
    }

    /// Model owning triangle `prim`; `None` for winding triangles.
    pub fn model(&self, prim: u32) -> Option<ModelId> {
        self.tri_model[prim as usize]
    }

    /// Whether hits on this group go through the shadow policy.
    pub fn is_filtered(&self) -> bool {
        self.kind == GroupKind::Faces(OcclusionClass::Filtered)
    }
}

/// Mesh and ownership table built for one group, before it has a
/// geometry id.
pub struct GroupMesh {
    kind: GroupKind,
    /// Triangles ready for the scene.
    pub mesh: TriangleMesh,
    tri_face: Vec<Option<FaceId>>,
    tri_model: Vec<Option<ModelId>>,
}

impl GroupMesh {
    fn new(kind: GroupKind) -> Self {
        Self {
            kind,
            mesh: TriangleMesh::default(),
            tri_face: Vec::new(),
            tri_model: Vec::new(),
        }
    }

    /// Append a polygon as a fan around its first vertex:
    /// `(v0, v[k], v[k+1])` for `k` in `1..n-1`.
    fn push_fan(
        &mut self,
        points: impl IntoIterator<Item = Point3>,
        face: Option<FaceId>,
        model: Option<ModelId>,
    ) -> bool {
        let base = self.mesh.vertices.len();
        self.mesh.vertices.extend(points);
        let n = self.mesh.vertices.len() - base;
        if n < 3 {
            self.mesh.vertices.truncate(base);
            return false;
        }

        let base = base as u32;
        for k in 1..(n as u32 - 1) {
            self.mesh.triangles.push([base, base + k, base + k + 1]);
            self.tri_face.push(face);
            self.tri_model.push(model);
        }
        true
    }

    /// Fan-triangulate `faces` of one class.
    pub fn from_faces(world: &World, class: OcclusionClass, faces: &[(FaceId, ModelId)]) -> Self {
        let mut group = Self::new(GroupKind::Faces(class));
        for &(face, model) in faces {
            if !group.push_fan(world.face_points(face), Some(face), Some(model)) {
                log::debug!("skipping degenerate face {} of model {}", face, model);
            }
        }
        group
    }

    /// Fan-triangulate auxiliary windings.
    pub fn from_windings(windings: &[Winding]) -> Self {
        let mut group = Self::new(GroupKind::Skip);
        for (i, winding) in windings.iter().enumerate() {
            if !group.push_fan(winding.points().iter().copied(), None, None) {
                log::debug!("skipping degenerate winding {}", i);
            }
        }
        group
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Add the mesh to `builder`, registering the policy filter for the
    /// filtered class, and keep the ownership table under its new id.
    pub fn register(self, builder: &mut SceneBuilder) -> SceneGroup {
        let geom = builder.add_triangle_mesh(self.mesh);
        let group = SceneGroup {
            kind: self.kind,
            geom,
            tri_face: self.tri_face,
            tri_model: self.tri_model,
        };
        if group.is_filtered() {
            builder.set_filter(geom);
        }
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::scene::SceneConfig;
    use crate::testutil::add_square;
    use shadowcast_world::{BspFormat, ModelInfo, TexInfo, Texture};

    #[test]
    fn test_fan_triangulation() {
        let mut world = World::new(BspFormat::Quake);
        let tex = world.add_texture(Texture::named("wall"));
        let ti = world.add_texinfo(TexInfo::planar(tex));
        let pentagon: Vec<Point3> = (0..5)
            .map(|i| {
                let a = i as f64 * std::f64::consts::TAU / 5.0;
                Point3::new(a.cos(), a.sin(), 0.0)
            })
            .collect();
        world.add_model(ModelInfo::world(), vec![(pentagon, ti)]);

        let group = GroupMesh::from_faces(&world, OcclusionClass::Solid, &[(0, 0)]);
        assert_eq!(group.triangle_count(), 3);
        assert_eq!(group.mesh.triangles, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    }

    #[test]
    fn test_degenerate_faces_are_skipped() {
        let mut world = World::new(BspFormat::Quake);
        let tex = world.add_texture(Texture::named("wall"));
        let ti = world.add_texinfo(TexInfo::planar(tex));
        let sliver = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        world.add_model(ModelInfo::world(), vec![(sliver, ti)]);

        let group = GroupMesh::from_faces(&world, OcclusionClass::Solid, &[(0, 0)]);
        assert_eq!(group.triangle_count(), 0);
        assert!(group.mesh.vertices.is_empty());
    }

    #[test]
    fn test_triangle_lookup_round_trips() {
        let mut world = World::new(BspFormat::Quake);
        add_square(&mut world, ModelInfo::world(), Texture::named("wall"), 0.0);
        add_square(&mut world, ModelInfo::shadow_caster(), Texture::named("crate"), 4.0);
        add_square(&mut world, ModelInfo::world(), Texture::named("floor"), -4.0);

        let classes = Classification::of_world(&world);
        let mut builder = SceneBuilder::new(SceneConfig::default(), 4);
        let group =
            GroupMesh::from_faces(&world, OcclusionClass::Solid, &classes.solid).register(&mut builder);

        assert_eq!(group.triangle_count(), 6);
        for prim in 0..group.triangle_count() as u32 {
            let face = group.face(prim).unwrap();
            let model = group.model(prim).unwrap();
            assert!(classes.solid.contains(&(face, model)));
            assert!(world.models[model].faces().contains(&face));
        }
        assert_eq!(group.face(2), Some(1));
        assert_eq!(group.model(2), Some(1));
    }

    #[test]
    fn test_filtered_group_registers_filter() {
        let mut world = World::new(BspFormat::Quake);
        add_square(&mut world, ModelInfo::switchable(2), Texture::named("door"), 0.0);
        let classes = Classification::of_world(&world);

        let mut builder = SceneBuilder::new(SceneConfig::default(), 4);
        let solid = GroupMesh::from_faces(&world, OcclusionClass::Solid, &classes.solid)
            .register(&mut builder);
        let filtered = GroupMesh::from_faces(&world, OcclusionClass::Filtered, &classes.filtered)
            .register(&mut builder);
        let scene = builder.commit();

        assert_eq!((solid.geom, filtered.geom), (0, 1));
        assert!(!scene.is_filtered(solid.geom));
        assert!(scene.is_filtered(filtered.geom));
        assert_eq!(scene.mesh(filtered.geom).triangle_count(), 2);
    }

    #[test]
    fn test_winding_group_has_no_owners() {
        let winding = Winding::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);
        let mut builder = SceneBuilder::new(SceneConfig::default(), 4);
        let group = GroupMesh::from_windings(&[winding]).register(&mut builder);
        assert_eq!(group.triangle_count(), 2);
        assert_eq!(group.kind, GroupKind::Skip);
        assert!(!group.is_filtered());
        assert!(!builder.commit().is_filtered(group.geom));
        assert_eq!(group.face(0), None);
        assert_eq!(group.model(1), None);
    }
}
