//! View, projection and clip-to-texture math for shadow views.
//!
//! Every projection is built for the backend's native depth range, and
//! `clip_to_texture` remaps that range into [0,1] so a shadow matrix always
//! lands in texture space regardless of the graphics API.

use glam::{Mat4, Vec3, Vec4};
use log::warn;

/// Added to a spot light's outer half-angle so the cone edge never touches
/// the shadow frustum's clip planes.
pub const SPOT_FOV_MARGIN_DEG: f32 = 5.0;
const MIN_SPOT_FOV_DEG: f32 = 1.0;
const MAX_SPOT_FOV_DEG: f32 = 170.0;

/// Normalized-device depth range produced by the backend's projections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthRange {
    /// Direct3D / Vulkan / Metal, or OpenGL with `glClipControl(.., GL_ZERO_TO_ONE)`.
    ZeroToOne,
    /// Default OpenGL convention.
    NegOneToOne,
}

impl DepthRange {
    /// Resolve a backend report. An unknown convention falls back to
    /// [-1,1], which is what an OpenGL context uses unless told otherwise.
    pub fn resolve(reported: Option<DepthRange>) -> DepthRange {
        match reported {
            Some(range) => range,
            None => {
                warn!("backend did not report its clip depth range, assuming [-1, 1]");
                DepthRange::NegOneToOne
            }
        }
    }

    pub fn perspective(self, fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        match self {
            DepthRange::ZeroToOne => Mat4::perspective_rh(fov_y_radians, aspect, near, far),
            DepthRange::NegOneToOne => Mat4::perspective_rh_gl(fov_y_radians, aspect, near, far),
        }
    }

    /// Symmetric orthographic box of half-width `half_extent`.
    pub fn orthographic(self, half_extent: f32, near: f32, far: f32) -> Mat4 {
        let h = half_extent;
        match self {
            DepthRange::ZeroToOne => Mat4::orthographic_rh(-h, h, -h, h, near, far),
            DepthRange::NegOneToOne => Mat4::orthographic_rh_gl(-h, h, -h, h, near, far),
        }
    }
}

/// Maps clip space into [0,1] texture space. XY always go from [-1,1] to
/// [0,1]; Z is passed through for a [0,1] backend and scaled/offset by 0.5
/// for a [-1,1] backend.
pub fn clip_to_texture(range: DepthRange) -> Mat4 {
    let (z_scale, z_offset) = match range {
        DepthRange::ZeroToOne => (1.0, 0.0),
        DepthRange::NegOneToOne => (0.5, 0.5),
    };
    Mat4::from_cols(
        Vec4::new(0.5, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 0.5, 0.0, 0.0),
        Vec4::new(0.0, 0.0, z_scale, 0.0),
        Vec4::new(0.5, 0.5, z_offset, 1.0),
    )
}

/// World-to-view matrix for an eye looking along `forward`.
pub fn light_view(eye: Vec3, forward: Vec3) -> Mat4 {
    let forward = forward.normalize_or(Vec3::NEG_Z);
    // Y is a degenerate up vector for lights aimed straight up or down.
    let up = if forward.dot(Vec3::Y).abs() > 0.999 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    Mat4::look_to_rh(eye, forward, up)
}

/// Full vertical field of view (degrees) of a spot light's shadow frustum.
pub fn spot_fov_deg(outer_cone_deg: f32) -> f32 {
    (2.0 * (outer_cone_deg + SPOT_FOV_MARGIN_DEG)).clamp(MIN_SPOT_FOV_DEG, MAX_SPOT_FOV_DEG)
}

/// One face of a cube shadow map, in OpenGL face order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Look direction and up vector matching the cube-map sampling convention.
    pub fn basis(self) -> (Vec3, Vec3) {
        match self {
            CubeFace::PositiveX => (Vec3::X, Vec3::NEG_Y),
            CubeFace::NegativeX => (Vec3::NEG_X, Vec3::NEG_Y),
            CubeFace::PositiveY => (Vec3::Y, Vec3::Z),
            CubeFace::NegativeY => (Vec3::NEG_Y, Vec3::NEG_Z),
            CubeFace::PositiveZ => (Vec3::Z, Vec3::NEG_Y),
            CubeFace::NegativeZ => (Vec3::NEG_Z, Vec3::NEG_Y),
        }
    }

    pub fn view(self, eye: Vec3) -> Mat4 {
        let (dir, up) = self.basis();
        Mat4::look_to_rh(eye, dir, up)
    }
}

/// 90 degree square projection shared by all six cube faces.
pub fn cube_face_projection(range: DepthRange, near: f32, far: f32) -> Mat4 {
    range.perspective(std::f32::consts::FRAC_PI_2, 1.0, near, far)
}
