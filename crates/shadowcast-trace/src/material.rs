//! Material predicates over world faces, per [`BspFormat`].

use shadowcast_world::{BspFormat, FaceId, ModelInfo, SurfaceFlags, World};

/// Opacity of Quake 2 `TRANS33` glass.
pub const TRANS33_OPACITY: f64 = 0.66;
/// Opacity of Quake 2 `TRANS66` glass.
pub const TRANS66_OPACITY: f64 = 0.33;

/// How light crosses a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transparency {
    /// Blocks light.
    Opaque,
    /// Cut-out texture; texels with alpha below 255 are holes.
    Fence,
    /// Tinted glass of the given opacity.
    Glass {
        /// Default opacity before the texel alpha is consulted.
        opacity: f64,
    },
}

/// Material queries for the faces of one world.
#[derive(Clone, Copy)]
pub struct MaterialRules<'w> {
    world: &'w World,
}

impl<'w> MaterialRules<'w> {
    /// Rules for `world`'s format.
    pub fn new(world: &'w World) -> Self {
        Self { world }
    }

    fn format(&self) -> BspFormat {
        self.world.format
    }

    fn name_starts_with(&self, face: FaceId, prefix: &str) -> bool {
        let name = self.world.face_texture_name(face);
        name.len() >= prefix.len()
            && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
    }

    /// Texinfo `light_alpha` override if set, else the model's alpha.
    pub fn face_alpha(&self, info: &ModelInfo, face: FaceId) -> f32 {
        self.world
            .face_extended(face)
            .light_alpha()
            .unwrap_or(info.alpha)
    }

    /// The compiler was told this face casts no shadow.
    pub fn is_no_shadow(&self, face: FaceId) -> bool {
        self.world.face_extended(face).no_shadow
    }

    /// Invisible surface that does not double as sky.
    pub fn is_no_draw(&self, face: FaceId) -> bool {
        match self.format() {
            BspFormat::Quake => false,
            BspFormat::Quake2 => {
                let flags = self.world.face_flags(face);
                flags.contains(SurfaceFlags::NODRAW) && !flags.contains(SurfaceFlags::SKY)
            }
        }
    }

    /// Sky portal.
    pub fn is_sky(&self, face: FaceId) -> bool {
        match self.format() {
            BspFormat::Quake => self.name_starts_with(face, "sky"),
            BspFormat::Quake2 => {
                let flags = self.world.face_flags(face);
                flags.contains(SurfaceFlags::SKY | SurfaceFlags::LIGHT)
                    && self.world.face_texinfo(face).value != 0
            }
        }
    }

    /// Translucent liquid surface.
    pub fn is_liquid(&self, face: FaceId) -> bool {
        match self.format() {
            BspFormat::Quake => self.name_starts_with(face, "*"),
            BspFormat::Quake2 => {
                let trans = self.world.face_flags(face) & SurfaceFlags::TRANSLUCENT;
                trans == SurfaceFlags::TRANS33 || trans == SurfaceFlags::TRANS66
            }
        }
    }

    /// Texture name marks a cut-out, in either format.
    pub fn has_fence_name(&self, face: FaceId) -> bool {
        self.name_starts_with(face, "{")
    }

    /// Cut-out texture.
    pub fn is_fence(&self, face: FaceId) -> bool {
        match self.format() {
            BspFormat::Quake => self.has_fence_name(face),
            BspFormat::Quake2 => self
                .world
                .face_flags(face)
                .contains(SurfaceFlags::TRANSLUCENT),
        }
    }

    /// Whether light may partially cross the face, which sends it to the
    /// filtered group.
    pub fn is_translucent(&self, info: &ModelInfo, face: FaceId) -> bool {
        match self.format() {
            BspFormat::Quake => self.face_alpha(info, face) < 1.0,
            BspFormat::Quake2 => self.face_alpha(info, face) < 1.0
                || self.world.face_flags(face).intersects(SurfaceFlags::TRANSLUCENT),
        }
    }

    /// Transparency used when a ray reaches the face.
    pub fn transparency(&self, info: &ModelInfo, face: FaceId) -> Transparency {
        match self.format() {
            BspFormat::Quake => {
                let alpha = self.face_alpha(info, face);
                if alpha < 1.0 {
                    Transparency::Glass {
                        opacity: alpha as f64,
                    }
                } else if self.is_fence(face) {
                    Transparency::Fence
                } else {
                    Transparency::Opaque
                }
            }
            BspFormat::Quake2 => {
                let trans = self.world.face_flags(face) & SurfaceFlags::TRANSLUCENT;
                if trans == SurfaceFlags::TRANSLUCENT {
                    Transparency::Fence
                } else if trans == SurfaceFlags::TRANS33 {
                    Transparency::Glass {
                        opacity: TRANS33_OPACITY,
                    }
                } else if trans == SurfaceFlags::TRANS66 {
                    Transparency::Glass {
                        opacity: TRANS66_OPACITY,
                    }
                } else {
                    Transparency::Opaque
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{face_world, quake2_face_world};
    use shadowcast_world::ExtendedFlags;

    #[test]
    fn test_quake_names() {
        for (name, sky, liquid, fence) in [
            ("SKY1", true, false, false),
            ("skyrock", true, false, false),
            ("*water0", false, true, false),
            ("{grate", false, false, true),
            ("wall", false, false, false),
        ] {
            let world = face_world(name, ModelInfo::world());
            let rules = MaterialRules::new(&world);
            assert_eq!(rules.is_sky(0), sky, "{}", name);
            assert_eq!(rules.is_liquid(0), liquid, "{}", name);
            assert_eq!(rules.is_fence(0), fence, "{}", name);
            assert!(!rules.is_no_draw(0));
        }
    }

    #[test]
    fn test_alpha_override() {
        let mut world = face_world("wall", ModelInfo {
            alpha: 0.25,
            ..ModelInfo::shadow_caster()
        });
        let info = world.models[0].info.clone();
        assert_eq!(MaterialRules::new(&world).face_alpha(&info, 0), 0.25);

        world.texinfos[0].extended = ExtendedFlags {
            no_shadow: false,
            light_alpha: 127,
        };
        let rules = MaterialRules::new(&world);
        assert_eq!(rules.face_alpha(&info, 0), 1.0);
        assert_eq!(rules.transparency(&info, 0), Transparency::Opaque);
    }

    #[test]
    fn test_quake_glass_beats_fence() {
        let info = ModelInfo {
            alpha: 0.5,
            ..ModelInfo::shadow_caster()
        };
        let world = face_world("{grate", info.clone());
        assert_eq!(
            MaterialRules::new(&world).transparency(&info, 0),
            Transparency::Glass { opacity: 0.5 }
        );
    }

    #[test]
    fn test_quake2_flags() {
        let info = ModelInfo::world();

        let world = quake2_face_world(SurfaceFlags::TRANS33, 0);
        let rules = MaterialRules::new(&world);
        assert!(rules.is_liquid(0));
        assert!(rules.is_translucent(&info, 0));
        assert_eq!(
            rules.transparency(&info, 0),
            Transparency::Glass {
                opacity: TRANS33_OPACITY
            }
        );

        let world = quake2_face_world(SurfaceFlags::TRANS66, 0);
        assert_eq!(
            MaterialRules::new(&world).transparency(&info, 0),
            Transparency::Glass {
                opacity: TRANS66_OPACITY
            }
        );

        let world = quake2_face_world(SurfaceFlags::TRANSLUCENT, 0);
        let rules = MaterialRules::new(&world);
        assert!(rules.is_fence(0));
        assert!(!rules.is_liquid(0));
        assert_eq!(rules.transparency(&info, 0), Transparency::Fence);

        let world = quake2_face_world(SurfaceFlags::SKY | SurfaceFlags::LIGHT, 300);
        assert!(MaterialRules::new(&world).is_sky(0));
        let world = quake2_face_world(SurfaceFlags::SKY | SurfaceFlags::LIGHT, 0);
        assert!(!MaterialRules::new(&world).is_sky(0));

        let world = quake2_face_world(SurfaceFlags::NODRAW, 0);
        assert!(MaterialRules::new(&world).is_no_draw(0));
        let world = quake2_face_world(SurfaceFlags::NODRAW | SurfaceFlags::SKY, 0);
        assert!(!MaterialRules::new(&world).is_no_draw(0));
    }
}
