#![warn(missing_docs)]

//! Static polygon world model for the shadowcast visibility engine.
//!
//! The world is a flat, serde-serializable description of a compiled map:
//! shared vertices, faces grouped by model, texture projections with their
//! material flags, and the BSP node/leaf tree. Alongside it live the small
//! services the tracer consumes:
//!
//! - [`TextureSampler`] - material sample lookup at a point on a face
//! - [`Winding`] - convex polygon clipping
//! - [`leaf`] - boundary polygons of solid BSP leaves, for faceless models
//!
//! # Example
//!
//! ```rust
//! use shadowcast_math::Point3;
//! use shadowcast_world::{BspFormat, ModelInfo, TexInfo, Texture, World};
//!
//! let mut world = World::new(BspFormat::Quake);
//! let tex = world.add_texture(Texture::named("wall"));
//! let ti = world.add_texinfo(TexInfo::planar(tex));
//! let square = vec![
//!     Point3::new(-5.0, -5.0, 0.0),
//!     Point3::new(5.0, -5.0, 0.0),
//!     Point3::new(5.0, 5.0, 0.0),
//!     Point3::new(-5.0, 5.0, 0.0),
//! ];
//! world.add_model(ModelInfo::world(), vec![(square, ti)]);
//! assert!(world.validate().is_ok());
//! ```

pub mod error;
pub mod flags;
pub mod leaf;
pub mod model;
pub mod sampler;
pub mod winding;
mod world;

pub use error::{Result, WorldError};
pub use flags::{BspFormat, ExtendedFlags, SurfaceFlags};
pub use model::ModelInfo;
pub use sampler::{ColorRgba, TextureSampler, WorldTextureSampler};
pub use winding::Winding;
pub use world::{Face, FaceId, Leaf, Model, ModelId, Node, NodeChild, TexInfo, Texture, World};
