use gl::types::*;
use hecs::World;
use log::debug;
use std::ptr;

use super::shader::ShaderProgram;
use super::MeshStore;
use crate::components::{GlobalTransform, MeshHandle, NoShadow};
use crate::error::LightingError;
use crate::shadow::{DepthPass, ShadowBackend, ShadowMapHandle, TargetKind};

const DEPTH_VERT_SRC: &str = include_str!("../../shaders/depth.vert");
const DEPTH_FRAG_SRC: &str = include_str!("../../shaders/depth.frag");

/// OpenGL depth textures for every shadow caster, plus the framebuffer and
/// depth-only program used to render into them.
pub struct ShadowTargets {
    fbo: GLuint,
    depth_shader: ShaderProgram,
    /// (map, edge length in texels)
    live: Vec<(ShadowMapHandle, u32)>,
    max_flat_size: u32,
    max_cube_size: u32,
}

impl ShadowTargets {
    pub fn new() -> Result<Self, LightingError> {
        let depth_shader = ShaderProgram::from_sources(DEPTH_VERT_SRC, DEPTH_FRAG_SRC)?;

        let mut fbo = 0;
        let mut max_flat: GLint = 0;
        let mut max_cube: GLint = 0;
        unsafe {
            gl::GenFramebuffers(1, &mut fbo);
            gl::GetIntegerv(gl::MAX_TEXTURE_SIZE, &mut max_flat);
            gl::GetIntegerv(gl::MAX_CUBE_MAP_TEXTURE_SIZE, &mut max_cube);
        }

        Ok(Self {
            fbo,
            depth_shader,
            live: Vec::new(),
            max_flat_size: max_flat.max(0) as u32,
            max_cube_size: max_cube.max(0) as u32,
        })
    }

    fn resolution_of(&self, map: ShadowMapHandle) -> Option<u32> {
        self.live
            .iter()
            .find(|(live, _)| *live == map)
            .map(|&(_, res)| res)
    }

    /// Attach `texture` (or one of its cube faces) as the framebuffer's depth
    /// attachment. Caller binds the framebuffer.
    unsafe fn attach(&self, map: ShadowMapHandle, face: Option<usize>) {
        let target = match (map.kind, face) {
            (TargetKind::Cube, Some(face)) => gl::TEXTURE_CUBE_MAP_POSITIVE_X + face as GLenum,
            (TargetKind::Cube, None) => gl::TEXTURE_CUBE_MAP_POSITIVE_X,
            (TargetKind::Flat, _) => gl::TEXTURE_2D,
        };
        gl::FramebufferTexture2D(gl::FRAMEBUFFER, gl::DEPTH_ATTACHMENT, target, map.id, 0);
        gl::DrawBuffer(gl::NONE);
        gl::ReadBuffer(gl::NONE);
    }

    fn allocate(
        &mut self,
        kind: TargetKind,
        resolution: u32,
    ) -> Result<ShadowMapHandle, LightingError> {
        let max = match kind {
            TargetKind::Flat => self.max_flat_size,
            TargetKind::Cube => self.max_cube_size,
        };
        if resolution == 0 || resolution > max {
            return Err(LightingError::allocation(
                resolution,
                format!("{kind:?} target limit is {max}"),
            ));
        }

        let size = resolution as GLsizei;
        let mut texture = 0;
        unsafe {
            while gl::GetError() != gl::NO_ERROR {}

            gl::GenTextures(1, &mut texture);
            let bind_target = match kind {
                TargetKind::Flat => gl::TEXTURE_2D,
                TargetKind::Cube => gl::TEXTURE_CUBE_MAP,
            };
            gl::BindTexture(bind_target, texture);

            let faces: &[GLenum] = match kind {
                TargetKind::Flat => &[gl::TEXTURE_2D],
                TargetKind::Cube => &[
                    gl::TEXTURE_CUBE_MAP_POSITIVE_X,
                    gl::TEXTURE_CUBE_MAP_NEGATIVE_X,
                    gl::TEXTURE_CUBE_MAP_POSITIVE_Y,
                    gl::TEXTURE_CUBE_MAP_NEGATIVE_Y,
                    gl::TEXTURE_CUBE_MAP_POSITIVE_Z,
                    gl::TEXTURE_CUBE_MAP_NEGATIVE_Z,
                ],
            };
            for &face in faces {
                gl::TexImage2D(
                    face,
                    0,
                    gl::DEPTH_COMPONENT24 as GLint,
                    size,
                    size,
                    0,
                    gl::DEPTH_COMPONENT,
                    gl::FLOAT,
                    ptr::null(),
                );
            }

            gl::TexParameteri(bind_target, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(bind_target, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(bind_target, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
            gl::TexParameteri(bind_target, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
            if kind == TargetKind::Cube {
                gl::TexParameteri(bind_target, gl::TEXTURE_WRAP_R, gl::CLAMP_TO_EDGE as GLint);
            }
            gl::BindTexture(bind_target, 0);

            let upload_error = gl::GetError();
            let map = ShadowMapHandle { id: texture, kind };

            gl::BindFramebuffer(gl::FRAMEBUFFER, self.fbo);
            self.attach(map, None);
            let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);

            if upload_error != gl::NO_ERROR || status != gl::FRAMEBUFFER_COMPLETE {
                gl::DeleteTextures(1, &texture);
                return Err(LightingError::allocation(
                    resolution,
                    format!("GL error 0x{upload_error:x}, framebuffer status 0x{status:x}"),
                ));
            }

            self.live.push((map, resolution));
            debug!("allocated {kind:?} shadow target {texture} at {resolution}x{resolution}");
            Ok(map)
        }
    }

    fn release(&mut self, map: ShadowMapHandle) {
        let before = self.live.len();
        self.live.retain(|(live, _)| *live != map);
        if self.live.len() != before {
            unsafe {
                gl::DeleteTextures(1, &map.id);
            }
            debug!("released shadow target {}", map.id);
        }
    }

    fn render_depth(
        &mut self,
        world: &World,
        meshes: &MeshStore,
        map: ShadowMapHandle,
        pass: &DepthPass,
    ) {
        let Some(resolution) = self.resolution_of(map) else {
            debug!("render into unknown shadow target {}, skipping", map.id);
            return;
        };

        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, self.fbo);
            self.attach(map, pass.face.map(|f| f.index()));
            gl::Viewport(0, 0, resolution as GLsizei, resolution as GLsizei);
            gl::Clear(gl::DEPTH_BUFFER_BIT);
        }

        self.depth_shader.bind();
        self.depth_shader.set_mat4("u_light_view_proj", &pass.view_projection);
        self.depth_shader.set_vec3("u_light_pos", pass.eye);
        self.depth_shader.set_float("u_far", pass.far);
        self.depth_shader
            .set_int("u_linear_depth", i32::from(map.kind == TargetKind::Cube));

        for (_entity, (global_transform, mesh_handle)) in world
            .query::<(&GlobalTransform, &MeshHandle)>()
            .without::<&NoShadow>()
            .iter()
        {
            self.depth_shader.set_mat4("u_model", &global_transform.0);
            meshes.get(*mesh_handle).draw();
        }

        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        }
    }
}

impl Drop for ShadowTargets {
    fn drop(&mut self) {
        unsafe {
            for (map, _) in self.live.drain(..) {
                gl::DeleteTextures(1, &map.id);
            }
            gl::DeleteFramebuffers(1, &self.fbo);
        }
    }
}

/// `ShadowBackend` over the GL targets, drawing meshes from `meshes`.
pub struct GlShadowBackend<'a> {
    pub targets: &'a mut ShadowTargets,
    pub meshes: &'a MeshStore,
}

impl ShadowBackend for GlShadowBackend<'_> {
    fn allocate(
        &mut self,
        kind: TargetKind,
        resolution: u32,
    ) -> Result<ShadowMapHandle, LightingError> {
        self.targets.allocate(kind, resolution)
    }

    fn release(&mut self, map: ShadowMapHandle) {
        self.targets.release(map);
    }

    fn render_depth(&mut self, world: &World, map: ShadowMapHandle, pass: &DepthPass) {
        self.targets.render_depth(world, self.meshes, map, pass);
    }
}
