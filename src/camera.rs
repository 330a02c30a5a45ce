use glam::{Mat4, Vec3};

use crate::shadow::DepthRange;

/// Fixed viewpoint the scene is rendered from.
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            fov: 45.0,
            near: 0.1,
            far: 200.0,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32, depth_range: DepthRange) -> Mat4 {
        depth_range.perspective(self.fov.to_radians(), aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn target_projects_to_screen_center() {
        let camera = Camera::new(Vec3::new(0.0, 8.0, 16.0), Vec3::ZERO);
        for range in [DepthRange::ZeroToOne, DepthRange::NegOneToOne] {
            let ndc = (camera.projection_matrix(16.0 / 9.0, range) * camera.view_matrix())
                .project_point3(camera.target);
            assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
            assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
            let min_z = if range == DepthRange::ZeroToOne { 0.0 } else { -1.0 };
            assert!(ndc.z > min_z && ndc.z < 1.0);
        }
    }
}
