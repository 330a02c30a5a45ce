pub mod lighting_upload;
pub mod mesh;
pub mod shader;
pub mod shadow_targets;

use gl::types::*;
use glam::{Mat4, Vec3};
use hecs::World;
use log::info;
use std::ffi::CStr;

use lighting_upload::{upload_lighting, NeutralTextures};
use mesh::Mesh;
use shader::ShaderProgram;

use crate::components::{Checkerboard, Color, GlobalTransform, MeshHandle};
use crate::error::LightingError;
use crate::lighting::LightingFrame;
use crate::shadow::DepthRange;

const VERT_SRC: &str = include_str!("../../shaders/lit.vert");
const FRAG_SRC: &str = include_str!("../../shaders/lit.frag");

const CLEAR_COLOR: Vec3 = Vec3::new(0.1, 0.1, 0.15);
const AMBIENT_COLOR: Vec3 = Vec3::new(0.08, 0.08, 0.1);

/// Holds all loaded meshes. Entities reference meshes by MeshHandle index.
pub struct MeshStore {
    meshes: Vec<Mesh>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self { meshes: Vec::new() }
    }

    pub fn add(&mut self, mesh: Mesh) -> MeshHandle {
        let handle = MeshHandle(self.meshes.len());
        self.meshes.push(mesh);
        handle
    }

    pub fn get(&self, handle: MeshHandle) -> &Mesh {
        &self.meshes[handle.0]
    }
}

/// Ask the current GL context which clip depth range its projections use.
/// `None` when the context predates clip control and cannot say.
pub fn query_depth_range() -> Option<DepthRange> {
    unsafe {
        while gl::GetError() != gl::NO_ERROR {}
        let mut mode: GLint = 0;
        gl::GetIntegerv(gl::CLIP_DEPTH_MODE, &mut mode);
        if gl::GetError() != gl::NO_ERROR {
            return None;
        }
        match mode as GLenum {
            gl::ZERO_TO_ONE => Some(DepthRange::ZeroToOne),
            gl::NEGATIVE_ONE_TO_ONE => Some(DepthRange::NegOneToOne),
            _ => None,
        }
    }
}

fn gl_string(name: GLenum) -> String {
    unsafe {
        let ptr = gl::GetString(name);
        if ptr.is_null() {
            return String::from("unknown");
        }
        CStr::from_ptr(ptr as *const _).to_string_lossy().into_owned()
    }
}

unsafe fn create_neutral_textures() -> NeutralTextures {
    let white: [u8; 4] = [255, 255, 255, 255];
    let black: [u8; 4] = [0, 0, 0, 255];
    let mut ids = [0; 2];
    gl::GenTextures(2, ids.as_mut_ptr());

    gl::BindTexture(gl::TEXTURE_2D, ids[0]);
    gl::TexImage2D(
        gl::TEXTURE_2D,
        0,
        gl::RGBA8 as GLint,
        1,
        1,
        0,
        gl::RGBA,
        gl::UNSIGNED_BYTE,
        white.as_ptr() as *const _,
    );
    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);

    gl::BindTexture(gl::TEXTURE_CUBE_MAP, ids[1]);
    for face in 0..6 {
        gl::TexImage2D(
            gl::TEXTURE_CUBE_MAP_POSITIVE_X + face,
            0,
            gl::RGBA8 as GLint,
            1,
            1,
            0,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            black.as_ptr() as *const _,
        );
    }
    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);
    gl::BindTexture(gl::TEXTURE_CUBE_MAP, 0);
    gl::BindTexture(gl::TEXTURE_2D, 0);

    NeutralTextures {
        white_2d: ids[0],
        black_cube: ids[1],
    }
}

pub struct Renderer {
    shader: ShaderProgram,
    neutral: NeutralTextures,
    /// Distance that cube shadow maps normalize stored depth by.
    shadow_far: f32,
}

impl Renderer {
    pub fn init(shadow_far: f32) -> Result<Self, LightingError> {
        info!(
            "GL {} on {}",
            gl_string(gl::VERSION),
            gl_string(gl::RENDERER)
        );

        let neutral = unsafe {
            gl::Enable(gl::DEPTH_TEST);
            gl::Enable(gl::TEXTURE_CUBE_MAP_SEAMLESS);
            gl::ClearColor(CLEAR_COLOR.x, CLEAR_COLOR.y, CLEAR_COLOR.z, 1.0);
            create_neutral_textures()
        };

        let shader = ShaderProgram::from_sources(VERT_SRC, FRAG_SRC)?;

        Ok(Self {
            shader,
            neutral,
            shadow_far,
        })
    }

    /// Draw every visible mesh lit by `lighting`. Shadow passes leave the
    /// viewport at the shadow map size, so the window size is restored here.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_scene(
        &mut self,
        world: &World,
        meshes: &MeshStore,
        view: &Mat4,
        proj: &Mat4,
        camera_pos: Vec3,
        lighting: &LightingFrame,
        viewport: (u32, u32),
    ) {
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
            gl::Viewport(0, 0, viewport.0 as GLsizei, viewport.1 as GLsizei);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }

        self.shader.bind();
        self.shader.set_mat4("u_view", view);
        self.shader.set_mat4("u_projection", proj);
        self.shader.set_vec3("u_camera_pos", camera_pos);
        self.shader.set_vec3("u_ambient_color", AMBIENT_COLOR);
        self.shader.set_float("u_shadow_far", self.shadow_far);
        upload_lighting(&mut self.shader, lighting, self.neutral);

        for (_entity, (global_transform, mesh_handle, color, checker)) in world
            .query::<(&GlobalTransform, &MeshHandle, &Color, Option<&Checkerboard>)>()
            .iter()
        {
            self.shader.set_mat4("u_model", &global_transform.0);
            self.shader.set_vec3("u_object_color", color.0);
            if let Some(checker) = checker {
                self.shader.set_int("u_checkerboard", 1);
                self.shader.set_vec3("u_object_color_2", checker.0);
            } else {
                self.shader.set_int("u_checkerboard", 0);
            }
            meshes.get(*mesh_handle).draw();
        }
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let ids = [self.neutral.white_2d, self.neutral.black_cube];
        unsafe {
            gl::DeleteTextures(2, ids.as_ptr());
        }
    }
}
