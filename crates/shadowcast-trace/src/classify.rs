//! Sorting of world faces into occlusion classes.

use shadowcast_world::{leaf, FaceId, ModelId, ModelInfo, Winding, World};

use crate::error::ClassSizes;
use crate::material::MaterialRules;

/// How a face takes part in occlusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcclusionClass {
    /// Sky portal; blocks, and reports a sky hit.
    Sky,
    /// Always blocks.
    Solid,
    /// Blocks or passes depending on the shadow policy.
    Filtered,
}

/// Occlusion class of `face` owned by a model with policy `info`, or
/// `None` when the face never occludes.
pub fn classify_face(
    rules: &MaterialRules<'_>,
    info: &ModelInfo,
    face: FaceId,
) -> Option<OcclusionClass> {
    if !info.casts_shadows() {
        return None;
    }
    if rules.is_no_shadow(face) {
        return None;
    }
    if info.switchable_shadow {
        return Some(OcclusionClass::Filtered);
    }
    if rules.is_no_draw(face) {
        return None;
    }
    if rules.is_translucent(info, face) {
        return Some(OcclusionClass::Filtered);
    }
    if rules.has_fence_name(face) {
        return Some(OcclusionClass::Filtered);
    }
    if rules.is_sky(face) {
        return Some(OcclusionClass::Sky);
    }
    if rules.is_liquid(face) {
        // World liquids never shadow; brush entity liquids do.
        return if info.is_world {
            None
        } else {
            Some(OcclusionClass::Solid)
        };
    }
    if info.is_world || info.shadow {
        return Some(OcclusionClass::Solid);
    }

    assert!(
        info.shadow_self || info.shadow_world_only,
        "face {} reached the filtered fallback without a restricted shadow policy",
        face
    );
    Some(OcclusionClass::Filtered)
}

/// Faces of every class, each paired with its owning model, plus the
/// leaf-boundary windings of faceless shadow casters.
#[derive(Debug, Default)]
pub struct Classification {
    /// Sky faces.
    pub sky: Vec<(FaceId, ModelId)>,
    /// Solid faces.
    pub solid: Vec<(FaceId, ModelId)>,
    /// Filtered faces.
    pub filtered: Vec<(FaceId, ModelId)>,
    /// Boundary polygons of faceless shadow-casting models.
    pub skip_windings: Vec<Winding>,
}

impl Classification {
    /// Classify every face of every model in `world`.
    pub fn of_world(world: &World) -> Self {
        let rules = MaterialRules::new(world);
        let mut result = Self::default();

        for (model_id, model) in world.models.iter().enumerate() {
            if !model.info.casts_shadows() {
                continue;
            }
            for face in model.faces() {
                let list = match classify_face(&rules, &model.info, face) {
                    Some(OcclusionClass::Sky) => &mut result.sky,
                    Some(OcclusionClass::Solid) => &mut result.solid,
                    Some(OcclusionClass::Filtered) => &mut result.filtered,
                    None => continue,
                };
                list.push((face, model_id));
            }
        }

        for (model_id, model) in world.models.iter().enumerate() {
            if model.num_faces == 0 && !model.info.is_world && model.info.shadow {
                result
                    .skip_windings
                    .extend(leaf::model_windings(world, model_id));
            }
        }

        result
    }

    /// Entry counts per class.
    pub fn sizes(&self) -> ClassSizes {
        ClassSizes {
            sky: self.sky.len(),
            solid: self.solid.len(),
            filtered: self.filtered.len(),
            skip: self.skip_windings.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{add_square, box_tree, face_world, quake2_face_world};
    use shadowcast_world::{BspFormat, ExtendedFlags, SurfaceFlags, Texture};

    fn class_of(name: &str, info: ModelInfo) -> Option<OcclusionClass> {
        let world = face_world(name, info.clone());
        classify_face(&MaterialRules::new(&world), &info, 0)
    }

    #[test]
    fn test_no_policy_is_excluded() {
        assert_eq!(class_of("wall", ModelInfo::default()), None);
    }

    #[test]
    fn test_quake_rules() {
        let world = ModelInfo::world();
        let caster = ModelInfo::shadow_caster();
        assert_eq!(class_of("wall", world.clone()), Some(OcclusionClass::Solid));
        assert_eq!(class_of("sky4", world.clone()), Some(OcclusionClass::Sky));
        assert_eq!(class_of("{grate", world.clone()), Some(OcclusionClass::Filtered));
        assert_eq!(class_of("*lava1", world.clone()), None);
        assert_eq!(class_of("*lava1", caster.clone()), Some(OcclusionClass::Solid));
        assert_eq!(
            class_of(
                "wall",
                ModelInfo {
                    alpha: 0.5,
                    ..caster
                }
            ),
            Some(OcclusionClass::Filtered)
        );
    }

    #[test]
    fn test_switchable_wins_over_material() {
        for name in ["sky1", "*water", "wall"] {
            assert_eq!(
                class_of(name, ModelInfo::switchable(2)),
                Some(OcclusionClass::Filtered)
            );
        }
    }

    #[test]
    fn test_restricted_policies_are_filtered() {
        let self_only = ModelInfo {
            shadow_self: true,
            ..ModelInfo::default()
        };
        let world_only = ModelInfo {
            shadow_world_only: true,
            ..ModelInfo::default()
        };
        assert_eq!(class_of("wall", self_only), Some(OcclusionClass::Filtered));
        assert_eq!(class_of("wall", world_only), Some(OcclusionClass::Filtered));
    }

    #[test]
    fn test_no_shadow_flag_beats_switchable() {
        let mut world = face_world("wall", ModelInfo::switchable(1));
        world.texinfos[0].extended = ExtendedFlags {
            no_shadow: true,
            light_alpha: 0,
        };
        let info = world.models[0].info.clone();
        assert_eq!(classify_face(&MaterialRules::new(&world), &info, 0), None);
    }

    #[test]
    fn test_quake2_rules() {
        let info = ModelInfo::world();
        let cases = [
            (SurfaceFlags::empty(), 0, Some(OcclusionClass::Solid)),
            (SurfaceFlags::NODRAW, 0, None),
            (
                SurfaceFlags::NODRAW | SurfaceFlags::SKY | SurfaceFlags::LIGHT,
                100,
                Some(OcclusionClass::Sky),
            ),
            (SurfaceFlags::SKY, 100, Some(OcclusionClass::Solid)),
            (SurfaceFlags::TRANS33, 0, Some(OcclusionClass::Filtered)),
            (SurfaceFlags::TRANSLUCENT, 0, Some(OcclusionClass::Filtered)),
        ];
        for (flags, value, expected) in cases {
            let world = quake2_face_world(flags, value);
            assert_eq!(
                classify_face(&MaterialRules::new(&world), &info, 0),
                expected,
                "{:?}",
                flags
            );
        }
    }

    #[test]
    fn test_classification_is_deterministic() {
        let mut world = shadowcast_world::World::new(BspFormat::Quake);
        add_square(&mut world, ModelInfo::world(), Texture::named("wall"), 0.0);
        add_square(&mut world, ModelInfo::world(), Texture::named("sky3"), 8.0);
        add_square(&mut world, ModelInfo::switchable(4), Texture::named("door"), 4.0);
        add_square(&mut world, ModelInfo::default(), Texture::named("trigger"), 2.0);

        let a = Classification::of_world(&world);
        let b = Classification::of_world(&world);
        assert_eq!(a.solid, vec![(0, 0)]);
        assert_eq!(a.sky, vec![(1, 1)]);
        assert_eq!(a.filtered, vec![(2, 2)]);
        assert_eq!(a.solid, b.solid);
        assert_eq!(a.sky, b.sky);
        assert_eq!(a.filtered, b.filtered);
        assert_eq!(
            a.sizes(),
            ClassSizes {
                sky: 1,
                solid: 1,
                filtered: 1,
                skip: 0
            }
        );
    }

    #[test]
    fn test_faceless_shadow_model_contributes_windings() {
        let mut world = shadowcast_world::World::new(BspFormat::Quake);
        add_square(&mut world, ModelInfo::world(), Texture::named("wall"), 0.0);
        let head = box_tree(&mut world, 1.0, 3.0);
        world.add_faceless_model(ModelInfo::shadow_caster(), head);
        world.add_faceless_model(ModelInfo::switchable(1), head);

        let classes = Classification::of_world(&world);
        assert_eq!(classes.skip_windings.len(), 6);
        assert_eq!(classes.sizes().skip, 6);
    }
}
