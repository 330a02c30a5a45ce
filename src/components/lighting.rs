use glam::{Mat4, Vec3};

use crate::shadow::ShadowMapHandle;

/// Light type. The discriminant is the kind tag packed into the shader's color alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Directional = 0,
    Point = 1,
    Spot = 2,
}

impl LightKind {
    pub fn tag(self) -> f32 {
        self as i32 as f32
    }
}

/// Shadow map plus the world-to-texture matrix rendered in the same frame.
/// Point lights publish an identity matrix: their lookup is by direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PublishedShadow {
    pub map: ShadowMapHandle,
    pub view_projection: Mat4,
}

/// One light in the scene. Position and direction are refreshed from the
/// entity's `GlobalTransform` by `light_transform_system`.
#[derive(Clone, Debug, PartialEq)]
pub struct LightSource {
    pub kind: LightKind,
    pub color: Vec3,
    intensity: f32,
    /// (constant, linear, quadratic)
    pub attenuation: Vec3,
    outer_cone_deg: f32,
    inner_cone_deg: f32,
    pub casts_shadow: bool,
    pub enabled: bool,
    pub(crate) position: Vec3,
    pub(crate) direction: Vec3,
    pub(crate) shadow: Option<PublishedShadow>,
}

pub const DEFAULT_ATTENUATION: Vec3 = Vec3::new(1.0, 0.09, 0.032);

impl LightSource {
    pub fn new(kind: LightKind, color: Vec3, intensity: f32) -> Self {
        Self {
            kind,
            color,
            intensity: intensity.max(0.0),
            attenuation: DEFAULT_ATTENUATION,
            outer_cone_deg: 30.0,
            inner_cone_deg: 25.0,
            casts_shadow: false,
            enabled: true,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            shadow: None,
        }
    }

    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Directional, color, intensity)
    }

    pub fn point(color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Point, color, intensity)
    }

    pub fn spot(color: Vec3, intensity: f32, inner_deg: f32, outer_deg: f32) -> Self {
        let mut light = Self::new(LightKind::Spot, color, intensity);
        light.set_cone_angles(inner_deg, outer_deg);
        light
    }

    /// Attenuation terms derived from an effective radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        let radius = radius.max(f32::EPSILON);
        self.attenuation = Vec3::new(1.0, 4.5 / radius, 75.0 / (radius * radius));
        self
    }

    pub fn with_attenuation(mut self, attenuation: Vec3) -> Self {
        self.attenuation = attenuation;
        self
    }

    pub fn with_shadows(mut self) -> Self {
        self.casts_shadow = true;
        self
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Spot half-angles in degrees. Both are clamped to [0, 180] and the inner
    /// angle never exceeds the outer one.
    pub fn set_cone_angles(&mut self, inner_deg: f32, outer_deg: f32) {
        let outer = outer_deg.clamp(0.0, 180.0);
        self.outer_cone_deg = outer;
        self.inner_cone_deg = inner_deg.clamp(0.0, outer);
    }

    pub fn outer_cone_deg(&self) -> f32 {
        self.outer_cone_deg
    }

    pub fn inner_cone_deg(&self) -> f32 {
        self.inner_cone_deg
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current unit forward vector.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn shadow(&self) -> Option<&PublishedShadow> {
        self.shadow.as_ref()
    }

    pub(crate) fn publish_shadow(&mut self, shadow: PublishedShadow) {
        self.shadow = Some(shadow);
    }

    pub(crate) fn clear_shadow(&mut self) {
        self.shadow = None;
    }
}
