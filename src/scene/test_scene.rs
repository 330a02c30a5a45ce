use glam::Vec3;
use hecs::{Entity, World};

use crate::components::LightSource;
use crate::renderer::MeshStore;
use crate::scene::prefabs::{
    spawn_directional_light, spawn_ground, spawn_pillar, spawn_point_light, spawn_sphere,
    spawn_spot_light, spawn_static_box,
};

/// Build and populate the test scene: a few occluders and five lights, one
/// more than the shader has slots for. Lights that want shadows are flagged;
/// their casters are attached once the mesh store is complete.
///
/// Returns the meshes and the light entities in spawn order.
pub fn load_test_scene(world: &mut World) -> (MeshStore, Vec<Entity>) {
    let mut meshes = MeshStore::new();

    spawn_ground(world, &mut meshes, 60.0);

    let grey = Vec3::new(0.5, 0.5, 0.52);
    for &(x, z, h) in &[(6.0_f32, -4.0_f32, 2.0_f32), (-5.0, 3.0, 3.5), (3.0, 7.0, 1.5)] {
        spawn_static_box(
            world,
            &mut meshes,
            Vec3::new(x, h / 2.0, z),
            Vec3::new(2.5, h, 3.5),
            grey,
        );
    }
    spawn_sphere(
        world,
        &mut meshes,
        Vec3::new(0.0, 1.0, -3.0),
        1.0,
        Vec3::new(0.8, 0.2, 0.15),
    );
    spawn_pillar(
        world,
        &mut meshes,
        Vec3::new(5.0, 0.0, 3.0),
        0.4,
        2.5,
        Vec3::new(0.7, 0.65, 0.6),
    );

    let mut lights = Vec::with_capacity(5);
    lights.push(spawn_directional_light(
        world,
        Vec3::new(0.0, 15.0, 0.0),
        Vec3::new(-0.5, -1.0, -0.3),
        LightSource::directional(Vec3::new(1.0, 0.95, 0.85), 0.6).with_shadows(),
    ));
    lights.push(spawn_point_light(
        world,
        &mut meshes,
        Vec3::new(3.0, 3.0, 0.0),
        LightSource::point(Vec3::new(1.0, 0.6, 0.2), 2.0)
            .with_radius(15.0)
            .with_shadows(),
    ));
    lights.push(spawn_spot_light(
        world,
        &mut meshes,
        Vec3::new(5.0, 6.0, 5.0),
        Vec3::new(0.0, -1.0, -0.2),
        LightSource::spot(Vec3::new(1.0, 0.9, 0.7), 3.0, 25.0, 30.0)
            .with_radius(20.0)
            .with_shadows(),
    ));
    lights.push(spawn_point_light(
        world,
        &mut meshes,
        Vec3::new(-4.0, 2.0, -3.0),
        LightSource::point(Vec3::new(0.2, 0.4, 1.0), 1.5)
            .with_attenuation(Vec3::new(1.0, 0.14, 0.07)),
    ));
    // Fifth light: dropped by the aggregator while the other four are enabled.
    lights.push(spawn_point_light(
        world,
        &mut meshes,
        Vec3::new(0.0, 4.0, -8.0),
        LightSource::point(Vec3::new(0.1, 0.9, 0.3), 1.8).with_radius(18.0),
    ));

    (meshes, lights)
}
