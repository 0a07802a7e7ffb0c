//! Batched ray queries with per-ray lighting state.
//!
//! A [`RayBatch`] collects up to `capacity` rays, traces them against a
//! [`TraceEngine`] in one pass, and exposes per-slot results. Glass tint and
//! switchable occluder styles encountered by each ray are written to that
//! ray's own slot.

use shadowcast_math::{Color3, Point3, Vec3};
use shadowcast_world::{FaceId, ModelId};

use crate::engine::{HitType, RayContext, RaySink, TraceEngine};
use crate::ray::Ray;
use crate::scene::CandidateHit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceMode {
    Occlusion,
    Intersection,
}

#[derive(Debug, Clone)]
struct Slot {
    point_index: usize,
    max_dist: f64,
    color: Color3,
    normal_contrib: Vec3,
    dynamic_style: i32,
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    occluded: bool,
    distance: f64,
    hit_type: HitType,
    face: Option<FaceId>,
}

impl Default for Outcome {
    fn default() -> Self {
        Self {
            occluded: false,
            distance: 0.0,
            hit_type: HitType::None,
            face: None,
        }
    }
}

/// Fixed-capacity batch of pending rays.
///
/// Storage is allocated once; [`RayBatch::clear`] empties the batch without
/// releasing it.
#[derive(Debug)]
pub struct RayBatch {
    capacity: usize,
    rays: Vec<Ray>,
    slots: Vec<Slot>,
    hits: Vec<Option<CandidateHit>>,
    outcomes: Vec<Outcome>,
    scratch: Vec<CandidateHit>,
    traced: Option<TraceMode>,
}

impl RayBatch {
    /// An empty batch holding up to `capacity` rays.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            rays: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            hits: vec![None; capacity],
            outcomes: vec![Outcome::default(); capacity],
            scratch: Vec::new(),
            traced: None,
        }
    }

    /// Queue a ray from `origin` along `direction`, at most `max_dist` long.
    ///
    /// `color` seeds the slot's carried color (zero when absent) and
    /// `normal_contrib` is stored untouched for the caller. Panics when the
    /// batch is full.
    pub fn push(
        &mut self,
        point_index: usize,
        origin: &Point3,
        direction: &Vec3,
        max_dist: f64,
        color: Option<&Color3>,
        normal_contrib: Option<&Vec3>,
    ) {
        assert!(
            self.rays.len() < self.capacity,
            "ray batch is full ({} rays)",
            self.capacity
        );
        self.rays.push(Ray::segment(*origin, *direction, max_dist));
        self.slots.push(Slot {
            point_index,
            max_dist,
            color: color.copied().unwrap_or_else(Color3::zeros),
            normal_contrib: normal_contrib.copied().unwrap_or_else(Vec3::zeros),
            dynamic_style: 0,
        });
        self.traced = None;
    }

    /// Number of queued rays.
    pub fn len(&self) -> usize {
        self.rays.len()
    }

    /// True when no rays are queued.
    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    /// Maximum number of rays.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True when another push would panic.
    pub fn is_full(&self) -> bool {
        self.rays.len() == self.capacity
    }

    /// Drop every queued ray, keeping the storage.
    pub fn clear(&mut self) {
        self.rays.clear();
        self.slots.clear();
        self.traced = None;
    }

    /// Test every ray for any blocking hit on behalf of `source`.
    pub fn trace_occlusion(&mut self, engine: &TraceEngine, source: Option<ModelId>) {
        self.trace(engine, source, TraceMode::Occlusion);
    }

    /// Find every ray's nearest blocking hit on behalf of `source`.
    pub fn trace_intersection(&mut self, engine: &TraceEngine, source: Option<ModelId>) {
        self.trace(engine, source, TraceMode::Intersection);
    }

    fn trace(&mut self, engine: &TraceEngine, source: Option<ModelId>, mode: TraceMode) {
        engine.check_source(source);
        self.traced = Some(mode);
        let n = self.rays.len();
        if n == 0 {
            return;
        }

        let rays = &self.rays;
        let slots = &mut self.slots;
        let filter = |i: usize, hit: &CandidateHit| {
            let slot = &mut slots[i];
            let mut ctx = RayContext {
                source,
                sink: RaySink::Slot {
                    dynamic_style: &mut slot.dynamic_style,
                    color: &mut slot.color,
                },
            };
            engine.filter_hit(&rays[i], hit, &mut ctx)
        };

        let hits = &mut self.hits[..n];
        match mode {
            TraceMode::Occlusion => {
                engine
                    .scene()
                    .occluded_stream(rays, &mut self.scratch, hits, filter)
            }
            TraceMode::Intersection => {
                engine
                    .scene()
                    .intersect_stream(rays, &mut self.scratch, hits, filter)
            }
        }

        for i in 0..n {
            let requested = self.slots[i].max_dist;
            self.outcomes[i] = match self.hits[i] {
                None => Outcome {
                    occluded: false,
                    distance: requested,
                    hit_type: HitType::None,
                    face: None,
                },
                Some(hit) => Outcome {
                    occluded: true,
                    // Occlusion stops at any blocker, so only the nearest-hit
                    // pass reports a distance.
                    distance: match mode {
                        TraceMode::Occlusion => requested,
                        TraceMode::Intersection => hit.t,
                    },
                    hit_type: engine.hit_type(hit.geom),
                    face: engine.lookup_face(hit.geom, hit.prim),
                },
            };
        }
    }

    fn check_slot(&self, slot: usize) {
        assert!(
            slot < self.rays.len(),
            "slot {} out of range for a batch of {} rays",
            slot,
            self.rays.len()
        );
    }

    fn outcome(&self, slot: usize) -> &Outcome {
        assert!(self.traced.is_some(), "ray batch read before tracing");
        self.check_slot(slot);
        &self.outcomes[slot]
    }

    /// Whether a blocking surface was hit.
    pub fn occluded(&self, slot: usize) -> bool {
        self.outcome(slot).occluded
    }

    /// Distance to the nearest blocker after an intersection trace; the
    /// requested distance otherwise.
    pub fn hit_dist(&self, slot: usize) -> f64 {
        self.outcome(slot).distance
    }

    /// Kind of surface that blocked the ray.
    pub fn hit_type(&self, slot: usize) -> HitType {
        self.outcome(slot).hit_type
    }

    /// Face that blocked the ray; `None` for misses and leaf-boundary hits.
    pub fn hit_face(&self, slot: usize) -> Option<FaceId> {
        self.outcome(slot).face
    }

    /// Carried color after glass tinting.
    pub fn color(&self, slot: usize) -> Color3 {
        self.outcome(slot);
        self.slots[slot].color
    }

    /// Style of the last switchable occluder the ray crossed, or 0.
    pub fn dynamic_style(&self, slot: usize) -> i32 {
        self.outcome(slot);
        self.slots[slot].dynamic_style
    }

    /// Maximum distance the ray was queued with.
    pub fn requested_dist(&self, slot: usize) -> f64 {
        self.check_slot(slot);
        self.slots[slot].max_dist
    }

    /// Unit direction of the ray.
    pub fn direction(&self, slot: usize) -> Vec3 {
        self.check_slot(slot);
        self.rays[slot].direction.into_inner()
    }

    /// Caller-supplied sample point index.
    pub fn point_index(&self, slot: usize) -> usize {
        self.check_slot(slot);
        self.slots[slot].point_index
    }

    /// Caller-supplied normal contribution.
    pub fn normal_contrib(&self, slot: usize) -> Vec3 {
        self.check_slot(slot);
        self.slots[slot].normal_contrib
    }
}
