//! Publishes a `LightingFrame` to the shading program under the global
//! uniform names the shaders declare.

use gl::types::*;

use super::shader::ShaderProgram;
use crate::lighting::{LightingFrame, TextureBinding, MAX_LIGHTS};

pub const GLOBAL_LIGHT_POS: &str = "GlobalLightPos";
pub const GLOBAL_LIGHT_DIR: &str = "GlobalLightDir";
pub const GLOBAL_LIGHT_COL: &str = "GlobalLightCol";
pub const GLOBAL_LIGHT_ATTEN: &str = "GlobalLightAtten";
pub const GLOBAL_SPOT_PARAMS: &str = "GlobalSpotParams";
pub const ACTIVE_LIGHT_COUNT: &str = "ActiveLightCount";
pub const GLOBAL_SHADOW_MATRICES: &str = "GlobalShadowMatrices";
pub const GLOBAL_SHADOW_ENABLED: &str = "GlobalShadowEnabled";
pub const GLOBAL_SHADOW_BIAS: &str = "GlobalShadowBias";

/// Texture unit 0 is left to material textures.
const FIRST_SHADOW_UNIT: u32 = 1;

/// Always-valid textures bound to shadow slots that have no map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeutralTextures {
    /// 1x1 opaque white 2D texture.
    pub white_2d: GLuint,
    /// 1x1 opaque black cube texture.
    pub black_cube: GLuint,
}

/// One sampler binding: which uniform, which unit, which texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SamplerBinding {
    pub uniform: String,
    pub unit: u32,
    pub target: GLenum,
    pub texture: GLuint,
}

pub fn shadow_map_uniform(slot: usize) -> String {
    format!("GlobalShadowMap{slot}")
}

pub fn shadow_cube_uniform(slot: usize) -> String {
    format!("GlobalShadowMapCube{slot}")
}

/// Resolve every shadow sampler slot to a concrete texture, substituting the
/// neutral textures for empty slots. 2D slots use units 1..=4, cube slots 5..=8.
pub fn sampler_bindings(frame: &LightingFrame, neutral: NeutralTextures) -> Vec<SamplerBinding> {
    let resolve = |binding: TextureBinding, fallback: GLuint| match binding {
        TextureBinding::Map(map) => map.id,
        TextureBinding::Neutral => fallback,
    };

    let flat = (0..MAX_LIGHTS).map(|slot| SamplerBinding {
        uniform: shadow_map_uniform(slot),
        unit: FIRST_SHADOW_UNIT + slot as u32,
        target: gl::TEXTURE_2D,
        texture: resolve(frame.shadow_maps[slot], neutral.white_2d),
    });
    let cube = (0..MAX_LIGHTS).map(|slot| SamplerBinding {
        uniform: shadow_cube_uniform(slot),
        unit: FIRST_SHADOW_UNIT + (MAX_LIGHTS + slot) as u32,
        target: gl::TEXTURE_CUBE_MAP,
        texture: resolve(frame.shadow_cube_maps[slot], neutral.black_cube),
    });
    flat.chain(cube).collect()
}

/// Upload every lighting global and bind all eight shadow samplers.
/// The program must be bound.
pub fn upload_lighting(shader: &mut ShaderProgram, frame: &LightingFrame, neutral: NeutralTextures) {
    shader.set_vec4_array(GLOBAL_LIGHT_POS, &frame.light_pos);
    shader.set_vec4_array(GLOBAL_LIGHT_DIR, &frame.light_dir);
    shader.set_vec4_array(GLOBAL_LIGHT_COL, &frame.light_col);
    shader.set_vec4_array(GLOBAL_LIGHT_ATTEN, &frame.light_atten);
    shader.set_vec4_array(GLOBAL_SPOT_PARAMS, &frame.spot_params);
    shader.set_int(ACTIVE_LIGHT_COUNT, frame.active_light_count);
    shader.set_mat4_array(GLOBAL_SHADOW_MATRICES, &frame.shadow_matrices);
    shader.set_float_array(GLOBAL_SHADOW_ENABLED, &frame.shadow_enabled);
    shader.set_float(GLOBAL_SHADOW_BIAS, frame.shadow_bias);

    for binding in sampler_bindings(frame, neutral) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + binding.unit);
            gl::BindTexture(binding.target, binding.texture);
        }
        shader.set_int(&binding.uniform, binding.unit as i32);
    }
    unsafe {
        gl::ActiveTexture(gl::TEXTURE0);
    }
}
