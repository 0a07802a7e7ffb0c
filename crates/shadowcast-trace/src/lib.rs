#![warn(missing_docs)]

//! Visibility and shadow tracing over a static polygon world.
//!
//! The engine sorts every face into an occlusion class, triangulates each
//! class into its own BVH-backed geometry, and answers visibility queries
//! while applying material rules to hits on conditionally transparent
//! surfaces (fences, glass, switchable and restricted shadow casters).
//!
//! # Architecture
//!
//! - [`classify`] - face to occlusion class rules
//! - [`geometry`] - fan triangulation with triangle to face/model lookup
//! - [`bvh`], [`scene`] - spatial queries with per-geometry hit filters
//! - [`policy`] - the per-hit shadow decision
//! - [`TraceEngine`] - initialization and single-ray queries
//! - [`RayBatch`] - batched queries carrying per-ray color and style
//!
//! # Example
//!
//! ```rust
//! use shadowcast_math::Point3;
//! use shadowcast_trace::{TraceEngine, TraceSettings};
//! use shadowcast_world::{BspFormat, ModelInfo, TexInfo, Texture, World, WorldTextureSampler};
//!
//! let mut world = World::new(BspFormat::Quake);
//! let tex = world.add_texture(Texture::named("floor"));
//! let ti = world.add_texinfo(TexInfo::planar(tex));
//! let square = vec![
//!     Point3::new(-5.0, -5.0, 0.0),
//!     Point3::new(5.0, -5.0, 0.0),
//!     Point3::new(5.0, 5.0, 0.0),
//!     Point3::new(-5.0, 5.0, 0.0),
//! ];
//! world.add_model(ModelInfo::world(), vec![(square, ti)]);
//!
//! let engine = TraceEngine::initialize(
//!     world,
//!     Box::new(WorldTextureSampler),
//!     TraceSettings::default(),
//! )
//! .unwrap();
//!
//! let seen = engine.test_light(
//!     &Point3::new(1.0, 2.0, 10.0),
//!     &Point3::new(1.0, 2.0, -10.0),
//!     None,
//! );
//! assert!(!seen.visible);
//! ```

pub mod bvh;
pub mod classify;
mod engine;
pub mod error;
pub mod geometry;
pub mod material;
pub mod policy;
mod ray;
pub mod scene;
pub mod settings;
mod stream;

#[cfg(test)]
mod testutil;

pub use classify::{Classification, OcclusionClass};
pub use engine::{
    DirtResult, HitType, LightVisibility, SceneStats, SkyVisibility, SurfaceHit, TraceEngine,
};
pub use error::{ClassSizes, Result, TraceError};
pub use policy::{Crossing, Verdict};
pub use ray::{Ray, TriangleHit};
pub use settings::TraceSettings;
pub use stream::RayBatch;
