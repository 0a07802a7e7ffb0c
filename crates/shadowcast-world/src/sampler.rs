//! Texel lookup for material transparency decisions.

use shadowcast_math::{Color3, Point3};

use crate::world::{FaceId, World};

/// An 8-bit RGBA texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha; 255 is fully opaque.
    pub a: u8,
}

impl ColorRgba {
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Create a texel.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Whether the texel is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// RGB scaled to `[0, 1]`.
    pub fn rgb(&self) -> Color3 {
        Color3::new(self.r as f64, self.g as f64, self.b as f64) / 255.0
    }
}

impl From<[u8; 4]> for ColorRgba {
    fn from(v: [u8; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Fetches the material sample of a face at a point on it.
pub trait TextureSampler: Send + Sync {
    /// Sample `face`'s material at world-space `point`.
    fn sample(&self, world: &World, face: FaceId, point: &Point3) -> ColorRgba;
}

/// Nearest-texel sampler over [`World::textures`], wrapping at the edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldTextureSampler;

impl TextureSampler for WorldTextureSampler {
    fn sample(&self, world: &World, face: FaceId, point: &Point3) -> ColorRgba {
        let texinfo = world.face_texinfo(face);
        let texture = &world.textures[texinfo.texture];
        if texture.pixels.is_empty() || texture.width == 0 || texture.height == 0 {
            return ColorRgba::WHITE;
        }

        let (s, t) = texinfo.project(point);
        let x = (s.floor() as i64).rem_euclid(texture.width as i64) as usize;
        let y = (t.floor() as i64).rem_euclid(texture.height as i64) as usize;
        texture.pixels[y * texture.width as usize + x].into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::BspFormat;
    use crate::model::ModelInfo;
    use crate::world::{TexInfo, Texture};

    fn checker_world() -> World {
        let mut world = World::new(BspFormat::Quake);
        let tex = world.add_texture(Texture {
            name: "{grate".into(),
            width: 2,
            height: 1,
            pixels: vec![[255, 0, 0, 255], [0, 0, 0, 0]],
        });
        let ti = world.add_texinfo(TexInfo::planar(tex));
        world.add_model(
            ModelInfo::world(),
            vec![(
                vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(2.0, 0.0, 0.0),
                    Point3::new(2.0, 1.0, 0.0),
                ],
                ti,
            )],
        );
        world
    }

    #[test]
    fn test_sample_texels() {
        let world = checker_world();
        let sampler = WorldTextureSampler;
        let red = sampler.sample(&world, 0, &Point3::new(0.5, 0.5, 0.0));
        assert_eq!(red, ColorRgba::new(255, 0, 0, 255));
        let hole = sampler.sample(&world, 0, &Point3::new(1.5, 0.5, 0.0));
        assert_eq!(hole.a, 0);
    }

    #[test]
    fn test_sample_wraps_negative() {
        let world = checker_world();
        let texel = WorldTextureSampler.sample(&world, 0, &Point3::new(-0.5, 0.5, 0.0));
        assert_eq!(texel.a, 0);
    }

    #[test]
    fn test_empty_texture_is_white() {
        let mut world = checker_world();
        world.textures[0].pixels.clear();
        let texel = WorldTextureSampler.sample(&world, 0, &Point3::origin());
        assert_eq!(texel, ColorRgba::WHITE);
    }

    #[test]
    fn test_rgb_scale() {
        let c = ColorRgba::new(255, 0, 51, 255).rgb();
        assert!((c.x - 1.0).abs() < 1e-12);
        assert!((c.z - 0.2).abs() < 1e-12);
    }
}
