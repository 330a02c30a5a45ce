use glam::{Mat4, Vec4};

use crate::shadow::ShadowMapHandle;

/// Light slots available to the shader.
pub const MAX_LIGHTS: usize = 4;

/// What a shadow sampler slot is bound to. `Neutral` resolves to an opaque
/// white 2D texture or an opaque black cube texture at upload time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextureBinding {
    #[default]
    Neutral,
    Map(ShadowMapHandle),
}

impl TextureBinding {
    pub fn is_neutral(&self) -> bool {
        matches!(self, TextureBinding::Neutral)
    }
}

/// One frame's packed lighting state, laid out the way the shader reads it.
/// Slots at index >= `active_light_count` are always zeroed with neutral
/// texture bindings.
#[derive(Clone, Debug, PartialEq)]
pub struct LightingFrame {
    /// xyz = world position, w = 1
    pub light_pos: [Vec4; MAX_LIGHTS],
    /// xyz = forward direction, w = 0
    pub light_dir: [Vec4; MAX_LIGHTS],
    /// rgb = color * intensity, a = kind tag
    pub light_col: [Vec4; MAX_LIGHTS],
    /// xyz = (constant, linear, quadratic), w = 0
    pub light_atten: [Vec4; MAX_LIGHTS],
    /// x = cos(outer), y = cos(inner)
    pub spot_params: [Vec4; MAX_LIGHTS],
    pub active_light_count: i32,
    pub shadow_matrices: [Mat4; MAX_LIGHTS],
    pub shadow_enabled: [f32; MAX_LIGHTS],
    pub shadow_maps: [TextureBinding; MAX_LIGHTS],
    pub shadow_cube_maps: [TextureBinding; MAX_LIGHTS],
    pub shadow_bias: f32,
}

impl LightingFrame {
    /// A frame with no lights.
    pub fn empty(shadow_bias: f32) -> Self {
        Self {
            light_pos: [Vec4::ZERO; MAX_LIGHTS],
            light_dir: [Vec4::ZERO; MAX_LIGHTS],
            light_col: [Vec4::ZERO; MAX_LIGHTS],
            light_atten: [Vec4::ZERO; MAX_LIGHTS],
            spot_params: [Vec4::ZERO; MAX_LIGHTS],
            active_light_count: 0,
            shadow_matrices: [Mat4::ZERO; MAX_LIGHTS],
            shadow_enabled: [0.0; MAX_LIGHTS],
            shadow_maps: [TextureBinding::Neutral; MAX_LIGHTS],
            shadow_cube_maps: [TextureBinding::Neutral; MAX_LIGHTS],
            shadow_bias,
        }
    }

    pub fn active_lights(&self) -> usize {
        self.active_light_count as usize
    }

    /// True when slot `i` holds exactly the empty-slot values.
    #[cfg(test)]
    pub fn slot_is_neutral(&self, i: usize) -> bool {
        self.light_pos[i] == Vec4::ZERO
            && self.light_dir[i] == Vec4::ZERO
            && self.light_col[i] == Vec4::ZERO
            && self.light_atten[i] == Vec4::ZERO
            && self.spot_params[i] == Vec4::ZERO
            && self.shadow_matrices[i] == Mat4::ZERO
            && self.shadow_enabled[i] == 0.0
            && self.shadow_maps[i].is_neutral()
            && self.shadow_cube_maps[i].is_neutral()
    }
}
