//! Small worlds shared by the unit tests.

use shadowcast_math::{Plane, Point3, Vec3};
use shadowcast_world::{
    BspFormat, Leaf, ModelId, ModelInfo, Node, NodeChild, SurfaceFlags, TexInfo, Texture, World,
};

/// The square `[-5,5]^2` at height `z`, front side facing +Z.
pub fn square(z: f64) -> Vec<Point3> {
    vec![
        Point3::new(-5.0, -5.0, z),
        Point3::new(5.0, -5.0, z),
        Point3::new(5.0, 5.0, z),
        Point3::new(-5.0, 5.0, z),
    ]
}

/// Add a model made of one [`square`] at height `z` using `texture`.
pub fn add_square(world: &mut World, info: ModelInfo, texture: Texture, z: f64) -> ModelId {
    let tex = world.add_texture(texture);
    let ti = world.add_texinfo(TexInfo::planar(tex));
    world.add_model(info, vec![(square(z), ti)])
}

/// Quake world with a single model holding one square face at z = 0.
pub fn face_world(name: &str, info: ModelInfo) -> World {
    let mut world = World::new(BspFormat::Quake);
    add_square(&mut world, info, Texture::named(name), 0.0);
    world
}

/// Quake 2 world model with one square face carrying `flags` and `value`.
pub fn quake2_face_world(flags: SurfaceFlags, value: i32) -> World {
    let mut world = World::new(BspFormat::Quake2);
    let tex = world.add_texture(Texture::named("e1u1/floor1_3"));
    let ti = world.add_texinfo(TexInfo {
        flags,
        value,
        ..TexInfo::planar(tex)
    });
    world.add_model(ModelInfo::world(), vec![(square(0.0), ti)]);
    world
}

/// Quake BSP tree of the solid box `[lo, hi]^3`.
pub fn box_tree(world: &mut World, lo: f64, hi: f64) -> NodeChild {
    let inward = [
        Plane::new(Vec3::x(), lo),
        Plane::new(-Vec3::x(), -hi),
        Plane::new(Vec3::y(), lo),
        Plane::new(-Vec3::y(), -hi),
        Plane::new(Vec3::z(), lo),
        Plane::new(-Vec3::z(), -hi),
    ];
    let mut child = world.add_leaf(Leaf {
        contents: BspFormat::QUAKE_CONTENTS_SOLID,
    });
    for plane in inward.iter().rev() {
        let plane = world.add_plane(*plane);
        let outside = world.add_leaf(Leaf { contents: -1 });
        child = world.add_node(Node {
            plane,
            children: [child, outside],
        });
    }
    child
}
