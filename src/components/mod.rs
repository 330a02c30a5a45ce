pub mod lighting;

pub use lighting::{LightKind, LightSource, PublishedShadow};

use glam::{Mat4, Quat, Vec3};
use hecs::{Entity, World};

/// Spatial transform with position, rotation, and scale (local space).
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl LocalTransform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Transform at `position` whose forward axis (-Z) points along `direction`.
    pub fn looking_along(position: Vec3, direction: Vec3) -> Self {
        let dir = direction.normalize_or(Vec3::NEG_Z);
        Self {
            position,
            rotation: Quat::from_rotation_arc(Vec3::NEG_Z, dir),
            scale: Vec3::ONE,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Computed world-space transform matrix, updated by the propagation system.
pub struct GlobalTransform(pub Mat4);

impl GlobalTransform {
    pub fn translation(&self) -> Vec3 {
        self.0.w_axis.truncate()
    }

    /// World-space forward axis (-Z), normalized. Falls back to -Z for
    /// degenerate matrices.
    pub fn forward(&self) -> Vec3 {
        self.0
            .transform_vector3(Vec3::NEG_Z)
            .normalize_or(Vec3::NEG_Z)
    }
}

/// Points to the parent entity in the transform hierarchy.
pub struct Parent(pub Entity);

/// Lists child entities in the transform hierarchy.
pub struct Children(pub Vec<Entity>);

/// Attach `child` under `parent` in the transform hierarchy.
pub fn add_child(world: &mut World, parent: Entity, child: Entity) {
    let has_children = world.get::<&Children>(parent).is_ok();
    if has_children {
        if let Ok(mut children) = world.get::<&mut Children>(parent) {
            if !children.0.contains(&child) {
                children.0.push(child);
            }
        }
    } else {
        let _ = world.insert_one(parent, Children(vec![child]));
    }

    let _ = world.insert_one(child, Parent(parent));
}

/// Index into the MeshStore resource.
#[derive(Clone, Copy, Debug)]
pub struct MeshHandle(pub usize);

/// RGB color applied to an entity for rendering.
pub struct Color(pub Vec3);

/// Checkerboard pattern using primary Color and this secondary color.
pub struct Checkerboard(pub Vec3);

/// Marker: entity is drawn in the main pass but never rendered into shadow
/// maps (overlays, light gizmos).
pub struct NoShadow;
