pub mod matrix;

pub use matrix::{clip_to_texture, CubeFace, DepthRange};

use glam::{Mat4, Vec3};
use hecs::{Entity, NoSuchEntity, World};
use log::{info, warn};

use crate::components::{LightKind, LightSource};
use crate::config::ShadowConfig;
use crate::error::LightingError;

/// Shape of a shadow render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Flat,
    Cube,
}

impl TargetKind {
    pub fn for_light(kind: LightKind) -> Self {
        match kind {
            LightKind::Point => TargetKind::Cube,
            LightKind::Directional | LightKind::Spot => TargetKind::Flat,
        }
    }
}

/// Backend texture name of an allocated shadow target. Copyable so the
/// aggregator can rebind it without owning it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShadowMapHandle {
    pub id: u32,
    pub kind: TargetKind,
}

impl ShadowMapHandle {
    pub fn flat(id: u32) -> Self {
        Self {
            id,
            kind: TargetKind::Flat,
        }
    }

    pub fn cube(id: u32) -> Self {
        Self {
            id,
            kind: TargetKind::Cube,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionKind {
    Orthographic,
    Perspective,
    PerspectiveCube,
}

impl ProjectionKind {
    pub fn for_light(kind: LightKind) -> Self {
        match kind {
            LightKind::Directional => ProjectionKind::Orthographic,
            LightKind::Spot => ProjectionKind::Perspective,
            LightKind::Point => ProjectionKind::PerspectiveCube,
        }
    }
}

/// A single depth render: one 2D view, or one face of a cube.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthPass {
    /// projection * view, in the backend's native clip space.
    pub view_projection: Mat4,
    pub face: Option<CubeFace>,
    pub eye: Vec3,
    pub far: f32,
}

/// Depth renders needed for one light this frame.
#[derive(Clone, Debug, PartialEq)]
pub enum ShadowViewpoint {
    Single(DepthPass),
    Cube([DepthPass; 6]),
}

impl ShadowViewpoint {
    pub fn passes(&self) -> &[DepthPass] {
        match self {
            ShadowViewpoint::Single(pass) => std::slice::from_ref(pass),
            ShadowViewpoint::Cube(faces) => faces,
        }
    }
}

/// Render-target capability the shadow pass depends on.
pub trait ShadowBackend {
    /// Allocate a depth-only `resolution`² target (six faces for `Cube`),
    /// bilinear filtered and clamped to edge.
    fn allocate(&mut self, kind: TargetKind, resolution: u32)
        -> Result<ShadowMapHandle, LightingError>;

    fn release(&mut self, map: ShadowMapHandle);

    /// Rasterize scene depth into `map` (or the pass's cube face).
    fn render_depth(&mut self, world: &World, map: ShadowMapHandle, pass: &DepthPass);
}

/// Per-light shadow rendering state. Lives on the same entity as the
/// `LightSource` it serves and owns that light's depth target.
#[derive(Debug)]
pub struct ShadowCaster {
    pub resolution: u32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub ortho_half_extent: f32,
    pub directional_near_offset: f32,
    pub bias: f32,
    target: Option<ShadowMapHandle>,
    viewpoint: Option<ShadowViewpoint>,
}

impl ShadowCaster {
    pub fn from_config(config: &ShadowConfig) -> Self {
        Self {
            resolution: config.shadow_resolution,
            near_plane: config.near_plane,
            far_plane: config.far_plane,
            ortho_half_extent: config.ortho_half_extent,
            directional_near_offset: config.directional_near_offset,
            bias: config.shadow_bias,
            target: None,
            viewpoint: None,
        }
    }

    pub fn target(&self) -> Option<ShadowMapHandle> {
        self.target
    }

    /// Viewpoint used by the most recent render.
    pub fn viewpoint(&self) -> Option<&ShadowViewpoint> {
        self.viewpoint.as_ref()
    }

    pub(crate) fn set_target(&mut self, target: Option<ShadowMapHandle>) {
        self.target = target;
    }

    /// Compute this frame's depth passes for `light` and the matrix to publish
    /// alongside the map (identity for cube targets).
    pub fn compute_viewpoint(
        &mut self,
        light: &LightSource,
        range: DepthRange,
    ) -> (ShadowViewpoint, Mat4) {
        let eye = light.position();
        let viewpoint = match ProjectionKind::for_light(light.kind) {
            ProjectionKind::Orthographic => {
                let proj = range.orthographic(
                    self.ortho_half_extent,
                    -self.directional_near_offset,
                    self.far_plane,
                );
                ShadowViewpoint::Single(DepthPass {
                    view_projection: proj * matrix::light_view(eye, light.direction()),
                    face: None,
                    eye,
                    far: self.far_plane,
                })
            }
            ProjectionKind::Perspective => {
                let fov = matrix::spot_fov_deg(light.outer_cone_deg()).to_radians();
                let proj = range.perspective(fov, 1.0, self.near_plane, self.far_plane);
                ShadowViewpoint::Single(DepthPass {
                    view_projection: proj * matrix::light_view(eye, light.direction()),
                    face: None,
                    eye,
                    far: self.far_plane,
                })
            }
            ProjectionKind::PerspectiveCube => {
                let proj = matrix::cube_face_projection(range, self.near_plane, self.far_plane);
                ShadowViewpoint::Cube(CubeFace::ALL.map(|face| DepthPass {
                    view_projection: proj * face.view(eye),
                    face: Some(face),
                    eye,
                    far: self.far_plane,
                }))
            }
        };

        let published = match &viewpoint {
            ShadowViewpoint::Single(pass) => clip_to_texture(range) * pass.view_projection,
            ShadowViewpoint::Cube(_) => Mat4::IDENTITY,
        };
        self.viewpoint = Some(viewpoint.clone());
        (viewpoint, published)
    }
}

impl Default for ShadowCaster {
    fn default() -> Self {
        Self::from_config(&ShadowConfig::default())
    }
}

/// Attach `caster` to the light on `entity`, allocating its depth target.
/// On allocation failure the light is left unshadowed and the error returned.
pub fn attach_shadow_caster(
    world: &mut World,
    entity: Entity,
    mut caster: ShadowCaster,
    backend: &mut dyn ShadowBackend,
) -> Result<(), LightingError> {
    let kind = world
        .get::<&LightSource>(entity)
        .map(|light| light.kind)
        .map_err(|_| LightingError::missing(entity, "LightSource"))?;

    detach_shadow_caster(world, entity, backend);

    let allocated = if caster.resolution == 0 {
        Err(LightingError::allocation(0, "resolution must be non-zero"))
    } else {
        backend.allocate(TargetKind::for_light(kind), caster.resolution)
    };

    match allocated {
        Ok(map) => {
            caster.set_target(Some(map));
            if let Ok(mut light) = world.get::<&mut LightSource>(entity) {
                light.casts_shadow = true;
            }
            info!(
                "shadow caster attached to {entity:?}: {kind:?}, {}x{} {:?} target",
                caster.resolution, caster.resolution, map.kind
            );
            world
                .insert_one(entity, caster)
                .map_err(|_| LightingError::missing(entity, "entity"))
        }
        Err(err) => {
            warn!("{entity:?} continues unshadowed: {err}");
            if let Ok(mut light) = world.get::<&mut LightSource>(entity) {
                light.casts_shadow = false;
                light.clear_shadow();
            }
            Err(err)
        }
    }
}

/// Attach a caster built from `config` to every light that asks for shadows
/// but has none yet. Lights whose target cannot be allocated stay unshadowed.
///
/// Returns the number of casters attached.
pub fn attach_requested_casters(
    world: &mut World,
    config: &ShadowConfig,
    backend: &mut dyn ShadowBackend,
) -> usize {
    let pending: Vec<Entity> = world
        .query::<&LightSource>()
        .without::<&ShadowCaster>()
        .iter()
        .filter(|(_, light)| light.casts_shadow)
        .map(|(entity, _)| entity)
        .collect();

    let mut attached = 0;
    for entity in pending {
        if attach_shadow_caster(world, entity, ShadowCaster::from_config(config), backend).is_ok() {
            attached += 1;
        }
    }
    attached
}

/// Remove the caster from `entity`, releasing its target and clearing the
/// light's published shadow.
pub fn detach_shadow_caster(
    world: &mut World,
    entity: Entity,
    backend: &mut dyn ShadowBackend,
) -> Option<ShadowCaster> {
    let mut caster = world.remove_one::<ShadowCaster>(entity).ok()?;
    if let Some(map) = caster.target.take() {
        backend.release(map);
    }
    if let Ok(mut light) = world.get::<&mut LightSource>(entity) {
        light.casts_shadow = false;
        light.clear_shadow();
    }
    Some(caster)
}

/// Despawn a light entity, releasing its shadow target first.
pub fn despawn_light(
    world: &mut World,
    entity: Entity,
    backend: &mut dyn ShadowBackend,
) -> Result<(), NoSuchEntity> {
    detach_shadow_caster(world, entity, backend);
    world.despawn(entity)
}
