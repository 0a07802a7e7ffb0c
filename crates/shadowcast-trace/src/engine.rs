//! The visibility engine: scene construction from a world and the
//! single-ray queries.

use shadowcast_math::{Color3, Plane, Point3, Vec3};
use shadowcast_world::{FaceId, ModelId, TextureSampler, World};

use crate::classify::{Classification, OcclusionClass};
use crate::error::{ClassSizes, Result, TraceError};
use crate::geometry::{GroupKind, GroupMesh, SceneGroup};
use crate::policy::{tint, Crossing, PolicyHit, ShadowPolicy, Verdict};
use crate::ray::Ray;
use crate::scene::{CandidateHit, GeomId, Scene, SceneBuilder, SceneConfig};
use crate::settings::TraceSettings;
use crate::stream::RayBatch;

/// What a ray struck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitType {
    /// Nothing within range.
    #[default]
    None,
    /// A sky face.
    Sky,
    /// Any other occluder.
    Solid,
}

/// Result of [`TraceEngine::test_light`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightVisibility {
    /// No blocking surface lies between the two points.
    pub visible: bool,
    /// Style of the last switchable occluder crossed, or 0.
    pub dynamic_style: i32,
}

/// Result of [`TraceEngine::test_sky`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkyVisibility {
    /// The first blocking surface is sky.
    pub hit_sky: bool,
    /// Style of the last switchable occluder crossed, or 0.
    pub dynamic_style: i32,
    /// The sky face that was hit.
    pub face: Option<FaceId>,
}

/// Surface reached by [`TraceEngine::dirt_trace`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Distance from the ray origin.
    pub distance: f64,
    /// Plane through the hit point along the triangle's front normal.
    pub plane: Plane,
    /// Face that was hit; `None` for leaf-boundary geometry.
    pub face: Option<FaceId>,
}

/// Result of [`TraceEngine::dirt_trace`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirtResult {
    /// Kind of surface hit.
    pub hit_type: HitType,
    /// Details of the hit, when there is one.
    pub hit: Option<SurfaceHit>,
}

/// Sizes of the built scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Entries per occlusion class.
    pub sizes: ClassSizes,
    /// Triangles in the sky group.
    pub sky_triangles: usize,
    /// Triangles in the solid group.
    pub solid_triangles: usize,
    /// Triangles in the filtered group.
    pub filtered_triangles: usize,
    /// Triangles in the leaf-boundary group.
    pub skip_triangles: usize,
}

/// Where policy side effects land for one ray.
pub(crate) enum RaySink<'s> {
    /// A single query; only the switchable style is kept.
    Single { dynamic_style: i32 },
    /// A batch slot's style and color.
    Slot {
        dynamic_style: &'s mut i32,
        color: &'s mut Color3,
    },
}

/// Routing information carried by each traced ray.
pub(crate) struct RayContext<'s> {
    pub source: Option<ModelId>,
    pub sink: RaySink<'s>,
}

impl<'s> RayContext<'s> {
    pub(crate) fn single(source: Option<ModelId>) -> Self {
        Self {
            source,
            sink: RaySink::Single { dynamic_style: 0 },
        }
    }

    fn record(&mut self, crossing: Crossing) {
        match (crossing, &mut self.sink) {
            (Crossing::SwitchableShadow { style }, RaySink::Single { dynamic_style }) => {
                *dynamic_style = style;
            }
            (Crossing::SwitchableShadow { style }, RaySink::Slot { dynamic_style, .. }) => {
                **dynamic_style = style;
            }
            (Crossing::Glass { opacity, color }, RaySink::Slot { color: carried, .. }) => {
                let tinted = tint(carried, &color, opacity);
                **carried = tinted;
            }
            // Single queries carry no color.
            (Crossing::Glass { .. }, RaySink::Single { .. }) => {}
        }
    }

    fn dynamic_style(&self) -> i32 {
        match &self.sink {
            RaySink::Single { dynamic_style } => *dynamic_style,
            RaySink::Slot { dynamic_style, .. } => **dynamic_style,
        }
    }
}

/// Build-once, query-many visibility engine over a [`World`].
///
/// The engine is immutable after [`TraceEngine::initialize`] and may be
/// shared between threads; each thread traces through its own
/// [`RayBatch`].
pub struct TraceEngine {
    world: World,
    sampler: Box<dyn TextureSampler>,
    settings: TraceSettings,
    scene: Scene,
    groups: Vec<SceneGroup>,
    stats: SceneStats,
}

impl TraceEngine {
    /// Classify the world's faces, build one scene group per occlusion
    /// class plus the leaf-boundary group, and freeze the scene.
    pub fn initialize(
        world: World,
        sampler: Box<dyn TextureSampler>,
        settings: TraceSettings,
    ) -> Result<Self> {
        world.validate()?;
        settings.validate()?;

        let classes = Classification::of_world(&world);
        let sizes = classes.sizes();

        let meshes = [
            GroupMesh::from_faces(&world, OcclusionClass::Sky, &classes.sky),
            GroupMesh::from_faces(&world, OcclusionClass::Solid, &classes.solid),
            GroupMesh::from_faces(&world, OcclusionClass::Filtered, &classes.filtered),
            GroupMesh::from_windings(&classes.skip_windings),
        ];

        let mut builder = SceneBuilder::new(
            SceneConfig {
                ray_mask: settings.ray_mask,
            },
            settings.bvh_leaf_size,
        );
        let mut stats = SceneStats {
            sizes,
            ..SceneStats::default()
        };
        let mut groups = Vec::with_capacity(meshes.len());
        for group_mesh in meshes {
            let triangles = group_mesh.triangle_count();
            let group = group_mesh.register(&mut builder);
            match group.kind {
                GroupKind::Faces(OcclusionClass::Sky) => stats.sky_triangles = triangles,
                GroupKind::Faces(OcclusionClass::Solid) => stats.solid_triangles = triangles,
                GroupKind::Faces(OcclusionClass::Filtered) => {
                    stats.filtered_triangles = triangles
                }
                GroupKind::Skip => stats.skip_triangles = triangles,
            }
            groups.push(group);
        }

        if builder.config().ray_mask {
            return Err(TraceError::RayMaskEnabled { sizes });
        }

        let scene = builder.commit();

        log::info!("{} sky faces ({} triangles)", sizes.sky, stats.sky_triangles);
        log::info!("{} solid faces ({} triangles)", sizes.solid, stats.solid_triangles);
        log::info!(
            "{} filtered faces ({} triangles)",
            sizes.filtered,
            stats.filtered_triangles
        );
        log::info!(
            "{} shadow-casting skip faces ({} triangles)",
            sizes.skip,
            stats.skip_triangles
        );

        Ok(Self {
            world,
            sampler,
            settings,
            scene,
            groups,
            stats,
        })
    }

    /// The traced world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Settings the engine was built with.
    pub fn settings(&self) -> &TraceSettings {
        &self.settings
    }

    /// Class and triangle counts.
    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    /// The frozen spatial scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Triangle ownership of geometry `geom`. Panics on an id the engine
    /// did not create.
    pub fn scene_group(&self, geom: GeomId) -> &SceneGroup {
        self.groups
            .get(geom as usize)
            .unwrap_or_else(|| panic!("unexpected geometry id {}", geom))
    }

    /// Face that produced triangle `prim` of `geom`.
    pub fn lookup_face(&self, geom: GeomId, prim: u32) -> Option<FaceId> {
        self.scene_group(geom).face(prim)
    }

    /// Model owning triangle `prim` of `geom`.
    pub fn lookup_model(&self, geom: GeomId, prim: u32) -> Option<ModelId> {
        self.scene_group(geom).model(prim)
    }

    /// Sky or solid, by the group `geom` belongs to.
    pub fn hit_type(&self, geom: GeomId) -> HitType {
        match self.scene_group(geom).kind {
            GroupKind::Faces(OcclusionClass::Sky) => HitType::Sky,
            _ => HitType::Solid,
        }
    }

    /// An empty batch with the configured capacity.
    pub fn ray_batch(&self) -> RayBatch {
        RayBatch::new(self.settings.batch_capacity)
    }

    /// An empty batch holding up to `capacity` rays.
    pub fn ray_batch_with_capacity(&self, capacity: usize) -> RayBatch {
        RayBatch::new(capacity)
    }

    /// Panics unless `source` names a model of the world.
    pub(crate) fn check_source(&self, source: Option<ModelId>) {
        if let Some(model) = source {
            assert!(
                model < self.world.models.len(),
                "unknown source model {} ({} models)",
                model,
                self.world.models.len()
            );
        }
    }

    /// Apply the shadow policy to a filtered hit. Returns whether the hit
    /// blocks the ray.
    pub(crate) fn filter_hit(
        &self,
        ray: &Ray,
        hit: &CandidateHit,
        ctx: &mut RayContext<'_>,
    ) -> bool {
        let group = self.scene_group(hit.geom);
        let candidate = PolicyHit {
            face: group.face(hit.prim),
            model: group.model(hit.prim),
            point: ray.at(hit.t),
            direction: ray.direction.into_inner(),
            normal: hit.normal,
        };
        match ShadowPolicy::new(&self.world, self.sampler.as_ref()).evaluate(&candidate, ctx.source)
        {
            Verdict::Block => true,
            Verdict::PassThrough(None) => false,
            Verdict::PassThrough(Some(crossing)) => {
                ctx.record(crossing);
                false
            }
        }
    }

    /// Whether `stop` is visible from `start` for light cast by `source`.
    ///
    /// Blocked segments report style 0; visible ones report the style of the
    /// last switchable occluder crossed.
    pub fn test_light(
        &self,
        start: &Point3,
        stop: &Point3,
        source: Option<ModelId>,
    ) -> LightVisibility {
        self.check_source(source);
        let ray = Ray::between(start, stop);
        let mut ctx = RayContext::single(source);
        let mut scratch = Vec::new();
        let blocker = self
            .scene
            .occluded(&ray, &mut scratch, |hit| self.filter_hit(&ray, hit, &mut ctx));

        match blocker {
            Some(_) => LightVisibility {
                visible: false,
                dynamic_style: 0,
            },
            None => LightVisibility {
                visible: true,
                dynamic_style: ctx.dynamic_style(),
            },
        }
    }

    /// Trace from `start` along `direction` up to the configured sky reach
    /// and report whether the first blocking surface is sky.
    pub fn test_sky(
        &self,
        start: &Point3,
        direction: &Vec3,
        source: Option<ModelId>,
    ) -> SkyVisibility {
        self.check_source(source);
        let ray = Ray::segment(*start, *direction, self.settings.max_sky_dist);
        let mut ctx = RayContext::single(source);
        let mut scratch = Vec::new();
        let hit = self
            .scene
            .intersect(&ray, &mut scratch, |hit| self.filter_hit(&ray, hit, &mut ctx));

        let sky = hit.filter(|hit| self.hit_type(hit.geom) == HitType::Sky);
        SkyVisibility {
            hit_sky: sky.is_some(),
            dynamic_style: ctx.dynamic_style(),
            face: sky.and_then(|hit| self.lookup_face(hit.geom, hit.prim)),
        }
    }

    /// Nearest blocking surface within `max_dist` of `start` along
    /// `direction`.
    pub fn dirt_trace(
        &self,
        start: &Point3,
        direction: &Vec3,
        max_dist: f64,
        source: Option<ModelId>,
    ) -> DirtResult {
        self.check_source(source);
        let ray = Ray::segment(*start, *direction, max_dist);
        let mut ctx = RayContext::single(source);
        let mut scratch = Vec::new();
        let hit = self
            .scene
            .intersect(&ray, &mut scratch, |hit| self.filter_hit(&ray, hit, &mut ctx));

        match hit {
            None => DirtResult {
                hit_type: HitType::None,
                hit: None,
            },
            Some(hit) => DirtResult {
                hit_type: self.hit_type(hit.geom),
                hit: Some(SurfaceHit {
                    distance: hit.t,
                    plane: Plane::from_point_normal(&ray.at(hit.t), hit.normal),
                    face: self.lookup_face(hit.geom, hit.prim),
                }),
            },
        }
    }
}
