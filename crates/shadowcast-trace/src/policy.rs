//! Per-hit shadow decisions for filtered geometry.
//!
//! [`ShadowPolicy::evaluate`] is a pure function of the candidate hit and
//! the ray's source model. It never mutates ray state; the engine applies
//! the returned [`Verdict`] to the ray's context.

use shadowcast_math::{Color3, Point3, Vec3};
use shadowcast_world::{FaceId, ModelId, TextureSampler, World};

use crate::material::{MaterialRules, Transparency};

/// A candidate intersection with filtered geometry.
#[derive(Debug, Clone, Copy)]
pub struct PolicyHit {
    /// Face that was hit.
    pub face: Option<FaceId>,
    /// Model owning the face.
    pub model: Option<ModelId>,
    /// World-space hit point.
    pub point: Point3,
    /// Ray direction.
    pub direction: Vec3,
    /// Geometric normal of the hit triangle.
    pub normal: Vec3,
}

/// Side effect of a ray passing through a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crossing {
    /// Passed a switchable occluder controlled by light style `style`.
    SwitchableShadow {
        /// Light style of the occluder.
        style: i32,
    },
    /// Left a pane of tinted glass.
    Glass {
        /// Blend weight of the glass color.
        opacity: f64,
        /// Glass color in `[0, 1]`.
        color: Color3,
    },
}

/// Outcome of evaluating one candidate hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// The hit stops the ray.
    Block,
    /// The ray continues, possibly with a side effect.
    PassThrough(Option<Crossing>),
}

/// Shadow rules over one world and its texture sampler.
pub struct ShadowPolicy<'a> {
    world: &'a World,
    sampler: &'a dyn TextureSampler,
}

impl<'a> ShadowPolicy<'a> {
    /// Create a policy.
    pub fn new(world: &'a World, sampler: &'a dyn TextureSampler) -> Self {
        Self { world, sampler }
    }

    /// Decide whether `hit` blocks a ray cast on behalf of `source`.
    pub fn evaluate(&self, hit: &PolicyHit, source: Option<ModelId>) -> Verdict {
        let Some(model) = hit.model else {
            return Verdict::PassThrough(None);
        };
        let info = &self.world.models[model].info;

        if info.shadow_world_only {
            let from_world = source.is_some_and(|s| self.world.models[s].info.is_world);
            if !from_world {
                return Verdict::PassThrough(None);
            }
        }

        if info.shadow_self && source != Some(model) {
            return Verdict::PassThrough(None);
        }

        if info.switchable_shadow {
            return Verdict::PassThrough(Some(Crossing::SwitchableShadow {
                style: info.switch_shadow_style,
            }));
        }

        let Some(face) = hit.face else {
            return Verdict::Block;
        };

        match MaterialRules::new(self.world).transparency(info, face) {
            Transparency::Opaque => Verdict::Block,
            Transparency::Fence => {
                let texel = self.sampler.sample(self.world, face, &hit.point);
                if texel.is_opaque() {
                    Verdict::Block
                } else {
                    Verdict::PassThrough(None)
                }
            }
            Transparency::Glass { opacity } => {
                let texel = self.sampler.sample(self.world, face, &hit.point);
                let opacity = if texel.is_opaque() {
                    opacity
                } else {
                    texel.a as f64 / 255.0
                };

                // Rays travel from the receiver toward the light, so the
                // exiting side is the one facing away from the ray.
                if hit.direction.dot(&hit.normal) < 0.0 {
                    Verdict::PassThrough(Some(Crossing::Glass {
                        opacity,
                        color: texel.rgb(),
                    }))
                } else {
                    Verdict::PassThrough(None)
                }
            }
        }
    }
}

/// Filter `base` through glass: `o * (base * glass) + (1 - o) * base`,
/// componentwise, with `o` clamped to `[0, 1]`.
pub fn tint(base: &Color3, glass: &Color3, opacity: f64) -> Color3 {
    debug_assert!(
        glass.iter().all(|c| (0.0..=1.0).contains(c)),
        "glass color {:?} outside [0, 1]",
        glass
    );
    let o = opacity.clamp(0.0, 1.0);
    base.component_mul(glass) * o + base * (1.0 - o)
}
