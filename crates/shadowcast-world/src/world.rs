//! The static polygon world: vertices, faces, materials, models and the BSP
//! node/leaf tree used to recover the solid volume of faceless models.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shadowcast_math::{Plane, Point3};

use crate::error::{Result, WorldError};
use crate::flags::{BspFormat, ExtendedFlags, SurfaceFlags};
use crate::model::ModelInfo;

/// Index of a face in [`World::faces`].
pub type FaceId = usize;

/// Index of a model in [`World::models`].
pub type ModelId = usize;

/// A planar polygon. Vertices are listed counter-clockwise when seen from
/// the front side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Indices into [`World::vertices`].
    pub vertices: Vec<u32>,
    /// Index into [`World::texinfos`].
    pub texinfo: usize,
}

/// Texture projection and material flags shared by a set of faces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TexInfo {
    /// S and T projection axes; texel `s = vecs[0].xyz · p + vecs[0].w`.
    pub vecs: [[f64; 4]; 2],
    /// Index into [`World::textures`].
    pub texture: usize,
    /// Surface flags (Quake 2 worlds).
    #[serde(default)]
    pub flags: SurfaceFlags,
    /// Surface value; light emission for Quake 2 sky faces.
    #[serde(default)]
    pub value: i32,
    /// Compiler-only flags.
    #[serde(default)]
    pub extended: ExtendedFlags,
}

impl TexInfo {
    /// A texinfo projecting world X/Y onto S/T at unit scale.
    pub fn planar(texture: usize) -> Self {
        Self {
            vecs: [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]],
            texture,
            flags: SurfaceFlags::empty(),
            value: 0,
            extended: ExtendedFlags::default(),
        }
    }

    /// Texture-space coordinates of a world point.
    pub fn project(&self, p: &Point3) -> (f64, f64) {
        let [s, t] = self.vecs;
        (
            s[0] * p.x + s[1] * p.y + s[2] * p.z + s[3],
            t[0] * p.x + t[1] * p.y + t[2] * p.z + t[3],
        )
    }
}

/// An RGBA texture. An empty pixel array samples as opaque white.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    /// Material name; drives Quake material rules.
    pub name: String,
    /// Width in texels.
    #[serde(default)]
    pub width: u32,
    /// Height in texels.
    #[serde(default)]
    pub height: u32,
    /// Row-major texels.
    #[serde(default)]
    pub pixels: Vec<[u8; 4]>,
}

impl Texture {
    /// A texture with a name and no texel data.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    /// A 1x1 texture of a single color.
    pub fn solid(name: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            width: 1,
            height: 1,
            pixels: vec![rgba],
        }
    }
}

/// A child slot of a BSP node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeChild {
    /// Index into [`World::nodes`].
    Node(usize),
    /// Index into [`World::leaves`].
    Leaf(usize),
}

/// An interior BSP node splitting space by a plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Index into [`World::planes`].
    pub plane: usize,
    /// Front and back children.
    pub children: [NodeChild; 2],
}

/// A convex BSP leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    /// Leaf contents, interpreted per [`BspFormat`].
    pub contents: i32,
}

/// A renderable model: the world or a brush entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// First face in [`World::faces`].
    pub first_face: usize,
    /// Number of consecutive faces.
    pub num_faces: usize,
    /// Root of this model's BSP tree, if it has one.
    #[serde(default)]
    pub head_node: Option<NodeChild>,
    /// Shadow policy.
    #[serde(default)]
    pub info: ModelInfo,
}

impl Model {
    /// Range of face indices owned by this model.
    pub fn faces(&self) -> std::ops::Range<FaceId> {
        self.first_face..self.first_face + self.num_faces
    }
}

/// A complete static world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Material conventions.
    #[serde(default)]
    pub format: BspFormat,
    /// Shared vertex positions.
    #[serde(default)]
    pub vertices: Vec<Point3>,
    /// BSP split planes.
    #[serde(default)]
    pub planes: Vec<Plane>,
    /// Texture table.
    #[serde(default)]
    pub textures: Vec<Texture>,
    /// Texture projections and surface flags.
    #[serde(default)]
    pub texinfos: Vec<TexInfo>,
    /// All faces, grouped contiguously by model.
    #[serde(default)]
    pub faces: Vec<Face>,
    /// BSP interior nodes.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// BSP leaves.
    #[serde(default)]
    pub leaves: Vec<Leaf>,
    /// Models; model 0 is conventionally the world.
    #[serde(default)]
    pub models: Vec<Model>,
}

impl World {
    /// Create an empty world.
    pub fn new(format: BspFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from a JSON string and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let world: World = serde_json::from_str(json)?;
        world.validate()?;
        Ok(world)
    }

    /// Read and validate a JSON world file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Append a texture, returning its index.
    pub fn add_texture(&mut self, texture: Texture) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    /// Append a texinfo, returning its index.
    pub fn add_texinfo(&mut self, texinfo: TexInfo) -> usize {
        self.texinfos.push(texinfo);
        self.texinfos.len() - 1
    }

    /// Append a model whose faces are given as explicit polygons.
    ///
    /// Each polygon is `(points, texinfo)`; its vertices are appended to the
    /// shared vertex array.
    pub fn add_model(&mut self, info: ModelInfo, polygons: Vec<(Vec<Point3>, usize)>) -> ModelId {
        let first_face = self.faces.len();
        for (points, texinfo) in polygons {
            let base = self.vertices.len() as u32;
            let count = points.len() as u32;
            self.vertices.extend(points);
            self.faces.push(Face {
                vertices: (base..base + count).collect(),
                texinfo,
            });
        }
        self.models.push(Model {
            first_face,
            num_faces: self.faces.len() - first_face,
            head_node: None,
            info,
        });
        self.models.len() - 1
    }

    /// Append a model with no faces whose volume is given by a BSP subtree.
    pub fn add_faceless_model(&mut self, info: ModelInfo, head_node: NodeChild) -> ModelId {
        self.models.push(Model {
            first_face: self.faces.len(),
            num_faces: 0,
            head_node: Some(head_node),
            info,
        });
        self.models.len() - 1
    }

    /// Append a plane, returning its index.
    pub fn add_plane(&mut self, plane: Plane) -> usize {
        self.planes.push(plane);
        self.planes.len() - 1
    }

    /// Append a node, returning a child handle to it.
    pub fn add_node(&mut self, node: Node) -> NodeChild {
        self.nodes.push(node);
        NodeChild::Node(self.nodes.len() - 1)
    }

    /// Append a leaf, returning a child handle to it.
    pub fn add_leaf(&mut self, leaf: Leaf) -> NodeChild {
        self.leaves.push(leaf);
        NodeChild::Leaf(self.leaves.len() - 1)
    }

    /// Position of each vertex of a face, in order.
    pub fn face_points(&self, face: FaceId) -> impl Iterator<Item = Point3> + '_ {
        self.faces[face]
            .vertices
            .iter()
            .map(move |&v| self.vertices[v as usize])
    }

    /// The texinfo used by a face.
    pub fn face_texinfo(&self, face: FaceId) -> &TexInfo {
        &self.texinfos[self.faces[face].texinfo]
    }

    /// The texture used by a face.
    pub fn face_texture(&self, face: FaceId) -> &Texture {
        &self.textures[self.face_texinfo(face).texture]
    }

    /// Material name of a face.
    pub fn face_texture_name(&self, face: FaceId) -> &str {
        &self.face_texture(face).name
    }

    /// Surface flags of a face.
    pub fn face_flags(&self, face: FaceId) -> SurfaceFlags {
        self.face_texinfo(face).flags
    }

    /// Extended compiler flags of a face.
    pub fn face_extended(&self, face: FaceId) -> ExtendedFlags {
        self.face_texinfo(face).extended
    }

    /// Model owning each face; `None` for faces outside every model range.
    pub fn face_owners(&self) -> Vec<Option<ModelId>> {
        let mut owners = vec![None; self.faces.len()];
        for (model_id, model) in self.models.iter().enumerate() {
            for face in model.faces() {
                if let Some(slot) = owners.get_mut(face) {
                    *slot = Some(model_id);
                }
            }
        }
        owners
    }

    /// Check every cross reference and value range.
    pub fn validate(&self) -> Result<()> {
        fn check(what: &'static str, index: usize, len: usize) -> Result<()> {
            if index < len {
                Ok(())
            } else {
                Err(WorldError::InvalidReference { what, index, len })
            }
        }

        for face in &self.faces {
            check("texinfo", face.texinfo, self.texinfos.len())?;
            for &v in &face.vertices {
                check("vertex", v as usize, self.vertices.len())?;
            }
        }
        for texinfo in &self.texinfos {
            check("texture", texinfo.texture, self.textures.len())?;
            if texinfo.extended.light_alpha > ExtendedFlags::LIGHT_ALPHA_MAX {
                return Err(WorldError::InvalidValue(format!(
                    "light_alpha {} exceeds {}",
                    texinfo.extended.light_alpha,
                    ExtendedFlags::LIGHT_ALPHA_MAX
                )));
            }
        }
        for texture in &self.textures {
            if !texture.pixels.is_empty()
                && texture.pixels.len() != texture.width as usize * texture.height as usize
            {
                return Err(WorldError::InvalidValue(format!(
                    "texture '{}' has {} texels, expected {}x{}",
                    texture.name,
                    texture.pixels.len(),
                    texture.width,
                    texture.height
                )));
            }
        }
        let check_child = |child: NodeChild| match child {
            NodeChild::Node(n) => check("node", n, self.nodes.len()),
            NodeChild::Leaf(l) => check("leaf", l, self.leaves.len()),
        };
        for node in &self.nodes {
            check("plane", node.plane, self.planes.len())?;
            for child in node.children {
                check_child(child)?;
            }
        }
        for model in &self.models {
            if model.num_faces > 0 {
                check("face", model.first_face + model.num_faces - 1, self.faces.len())?;
            }
            if let Some(head) = model.head_node {
                check_child(head)?;
            }
            if !(0.0..=1.0).contains(&model.info.alpha) {
                return Err(WorldError::InvalidValue(format!(
                    "model alpha {} outside [0, 1]",
                    model.info.alpha
                )));
            }
        }
        self.check_acyclic()
    }

    /// Depth-first walk over every node, failing on a back edge. Child
    /// indices must already be in range.
    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Open,
            Done,
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        let mut stack: Vec<(usize, usize)> = Vec::new();
        for root in 0..self.nodes.len() {
            if marks[root] != Mark::New {
                continue;
            }
            marks[root] = Mark::Open;
            stack.push((root, 0));
            while let Some(&(node, next)) = stack.last() {
                if next == 2 {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                }
                let top = stack.len() - 1;
                stack[top].1 += 1;
                if let NodeChild::Node(child) = self.nodes[node].children[next] {
                    match marks[child] {
                        Mark::Open => return Err(WorldError::CyclicTree { node: child }),
                        Mark::New => {
                            marks[child] = Mark::Open;
                            stack.push((child, 0));
                        }
                        Mark::Done => {}
                    }
                }
            }
        }
        Ok(())
    }
}
