use glam::{Mat4, Vec3};
use hecs::{Entity, World};

use crate::components::*;
use crate::renderer::mesh::{box_data, cylinder_data, plane_data, sphere_data};
use crate::renderer::MeshStore;

const GIZMO_RADIUS: f32 = 0.12;

fn spawn_mesh(
    world: &mut World,
    local: LocalTransform,
    mesh: MeshHandle,
    color: Vec3,
) -> Entity {
    world.spawn((local, GlobalTransform(Mat4::IDENTITY), mesh, Color(color)))
}

/// Checkerboard ground plane centered at the origin.
pub fn spawn_ground(world: &mut World, meshes: &mut MeshStore, size: f32) -> Entity {
    let handle = meshes.add(plane_data(size, 32).upload());
    let ground = spawn_mesh(
        world,
        LocalTransform::new(Vec3::ZERO),
        handle,
        Vec3::new(0.35, 0.37, 0.35),
    );
    let _ = world.insert_one(ground, Checkerboard(Vec3::new(0.28, 0.3, 0.28)));
    ground
}

/// Box resting with its center at `pos`.
pub fn spawn_static_box(
    world: &mut World,
    meshes: &mut MeshStore,
    pos: Vec3,
    size: Vec3,
    color: Vec3,
) -> Entity {
    let handle = meshes.add(box_data(size.x, size.y, size.z).upload());
    spawn_mesh(world, LocalTransform::new(pos), handle, color)
}

pub fn spawn_sphere(
    world: &mut World,
    meshes: &mut MeshStore,
    pos: Vec3,
    radius: f32,
    color: Vec3,
) -> Entity {
    let handle = meshes.add(sphere_data(radius, 16, 24).upload());
    spawn_mesh(world, LocalTransform::new(pos), handle, color)
}

/// Upright cylinder standing on the ground at `base`.
pub fn spawn_pillar(
    world: &mut World,
    meshes: &mut MeshStore,
    base: Vec3,
    radius: f32,
    height: f32,
    color: Vec3,
) -> Entity {
    let handle = meshes.add(cylinder_data(radius, height, 20).upload());
    spawn_mesh(
        world,
        LocalTransform::new(base + Vec3::Y * height * 0.5),
        handle,
        color,
    )
}

/// Small unshadowed sphere parented to a light so its position is visible.
fn attach_gizmo(world: &mut World, meshes: &mut MeshStore, light: Entity, color: Vec3) {
    let handle = meshes.add(sphere_data(GIZMO_RADIUS, 6, 8).upload());
    let gizmo = spawn_mesh(world, LocalTransform::new(Vec3::ZERO), handle, color);
    let _ = world.insert_one(gizmo, NoShadow);
    add_child(world, light, gizmo);
}

/// Spawn a directional light whose origin sits at `pos`, shining along `direction`.
pub fn spawn_directional_light(
    world: &mut World,
    pos: Vec3,
    direction: Vec3,
    light: LightSource,
) -> Entity {
    world.spawn((
        LocalTransform::looking_along(pos, direction),
        GlobalTransform(Mat4::IDENTITY),
        light,
    ))
}

/// Spawn a point light at `pos` with a gizmo sphere.
pub fn spawn_point_light(
    world: &mut World,
    meshes: &mut MeshStore,
    pos: Vec3,
    light: LightSource,
) -> Entity {
    let color = light.color;
    let entity = world.spawn((
        LocalTransform::new(pos),
        GlobalTransform(Mat4::IDENTITY),
        light,
    ));
    attach_gizmo(world, meshes, entity, color);
    entity
}

/// Spawn a spot light at `pos` pointing in `direction`, with a gizmo sphere.
pub fn spawn_spot_light(
    world: &mut World,
    meshes: &mut MeshStore,
    pos: Vec3,
    direction: Vec3,
    light: LightSource,
) -> Entity {
    let color = light.color;
    let entity = world.spawn((
        LocalTransform::looking_along(pos, direction),
        GlobalTransform(Mat4::IDENTITY),
        light,
    ));
    attach_gizmo(world, meshes, entity, color);
    entity
}
