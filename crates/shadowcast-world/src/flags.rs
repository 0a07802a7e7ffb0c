//! Surface flag bits, extended per-texinfo flags and the BSP format tag.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Quake 2 style surface flags carried on a texinfo.
    ///
    /// Quake worlds leave these empty and derive materials from texture names.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SurfaceFlags: u32 {
        /// Surface emits light.
        const LIGHT = 0x1;
        /// Low friction.
        const SLICK = 0x2;
        /// Sky portal.
        const SKY = 0x4;
        /// Turbulent warp.
        const WARP = 0x8;
        /// 33% translucent.
        const TRANS33 = 0x10;
        /// 66% translucent.
        const TRANS66 = 0x20;
        /// Scrolling texture.
        const FLOWING = 0x40;
        /// Not drawn.
        const NODRAW = 0x80;
        /// Both translucency bits, used as a mask.
        const TRANSLUCENT = Self::TRANS33.bits() | Self::TRANS66.bits();
    }
}

/// Compiler-side flags attached to a texinfo that never reach the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtendedFlags {
    /// Faces using this texinfo never cast shadows.
    #[serde(default)]
    pub no_shadow: bool,
    /// 7-bit alpha override (`value / 127`); zero means unset.
    #[serde(default)]
    pub light_alpha: u8,
}

impl ExtendedFlags {
    /// Largest storable `light_alpha`.
    pub const LIGHT_ALPHA_MAX: u8 = 127;

    /// The alpha override as a float, or `None` when unset.
    pub fn light_alpha(&self) -> Option<f32> {
        let value = self.light_alpha & Self::LIGHT_ALPHA_MAX;
        if value == 0 {
            None
        } else {
            Some(value as f32 / Self::LIGHT_ALPHA_MAX as f32)
        }
    }
}

/// Which game's material conventions the world follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BspFormat {
    /// Texture-name driven materials (`sky*`, `*water`, `{fence`).
    #[default]
    Quake,
    /// Surface-flag driven materials.
    Quake2,
}

impl BspFormat {
    /// Quake's `CONTENTS_SOLID`.
    pub const QUAKE_CONTENTS_SOLID: i32 = -2;
    /// Quake 2's `CONTENTS_SOLID` bit.
    pub const QUAKE2_CONTENTS_SOLID: i32 = 1;

    /// Whether a leaf with these contents is solid.
    pub fn is_solid_leaf(&self, contents: i32) -> bool {
        match self {
            BspFormat::Quake => contents == Self::QUAKE_CONTENTS_SOLID,
            BspFormat::Quake2 => contents & Self::QUAKE2_CONTENTS_SOLID != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_alpha_unset() {
        assert_eq!(ExtendedFlags::default().light_alpha(), None);
    }

    #[test]
    fn test_light_alpha_scale() {
        let flags = ExtendedFlags {
            no_shadow: false,
            light_alpha: 127,
        };
        assert_eq!(flags.light_alpha(), Some(1.0));
        let half = ExtendedFlags {
            no_shadow: false,
            light_alpha: 64,
        };
        let a = half.light_alpha().unwrap();
        assert!((a - 64.0 / 127.0).abs() < 1e-6);
    }

    #[test]
    fn test_solid_leaf() {
        assert!(BspFormat::Quake.is_solid_leaf(-2));
        assert!(!BspFormat::Quake.is_solid_leaf(-1));
        assert!(BspFormat::Quake2.is_solid_leaf(1));
        assert!(BspFormat::Quake2.is_solid_leaf(3));
        assert!(!BspFormat::Quake2.is_solid_leaf(0));
    }

    #[test]
    fn test_translucent_mask() {
        assert!(SurfaceFlags::TRANSLUCENT.contains(SurfaceFlags::TRANS33));
        assert!(SurfaceFlags::TRANSLUCENT.contains(SurfaceFlags::TRANS66));
    }
}
