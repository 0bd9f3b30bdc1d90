use super::camera_utils::{Camera, CameraUniform};
use cgmath::*;

use crate::config::CameraConfig;

/// Maps OpenGL clip depth [-1, 1] to wgpu's [0, 1]; arguments are column-major
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Perspective camera defined by an eye position and a look target
///
/// Keyboard movement translates `eye` and re-pins `target`; the orbit
/// controls move `eye` around `target`.
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
}

impl Camera for FlyCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection_matrix() * self.view_matrix()
    }
}

impl FlyCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self {
            eye: config.position,
            target: config.target,
            up: Vector3::unit_y(),
            aspect,
            fovy: Deg(config.fov_degrees).into(),
            znear: config.znear,
            zfar: config.zfar,
            uniform: CameraUniform::default(),
        };
        camera.update_view_proj();
        camera
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(Point3::from_vec(self.eye), Point3::from_vec(self.target), self.up)
    }

    /// OpenGL-convention projection (clip z in [-1, 1]), used for unprojection
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    /// Unit vector from the eye toward the target
    pub fn look_direction(&self) -> Vector3<f32> {
        let direction = self.target - self.eye;
        if direction.magnitude2() <= f32::EPSILON {
            -Vector3::unit_z()
        } else {
            direction.normalize()
        }
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn update_view_proj(&mut self) {
        let view_proj = self.build_view_projection_matrix();
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = view_proj.into();
        self.uniform.inv_view_proj = view_proj
            .invert()
            .unwrap_or_else(Matrix4::identity)
            .into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DioramaConfig;
    use approx::assert_relative_eq;

    #[test]
    fn starts_at_configured_position_looking_at_origin() {
        let camera = FlyCamera::new(&DioramaConfig::default().camera, 1.5);
        assert_eq!(camera.eye, Vector3::new(0.0, 5.0, 10.0));
        let dir = camera.look_direction();
        assert_relative_eq!(dir.magnitude(), 1.0, epsilon = 1e-6);
        assert!(dir.z < 0.0 && dir.y < 0.0);
    }

    #[test]
    fn resize_ignores_zero_sized_surfaces() {
        let mut camera = FlyCamera::new(&DioramaConfig::default().camera, 1.5);
        camera.resize_projection(0, 600);
        assert_eq!(camera.aspect, 1.5);
        camera.resize_projection(800, 400);
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let mut camera = FlyCamera::new(&DioramaConfig::default().camera, 1.0);
        camera.update_view_proj();
        let vp = Matrix4::from(camera.uniform.view_proj);
        let clip = vp * camera.target.extend(1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth));
    }

    #[test]
    fn render_projection_agrees_with_unprojection() {
        let camera = FlyCamera::new(&DioramaConfig::default().camera, 1.5);
        let gl = camera.projection_matrix() * camera.view_matrix();
        let wgpu = camera.build_view_projection_matrix();

        for point in [
            Vector4::new(3.0, 1.0, -2.0, 1.0),
            Vector4::new(-4.0, 0.0, 3.0, 1.0),
            Vector4::new(0.5, 2.5, 0.0, 1.0),
        ] {
            let gl_clip = gl * point;
            let clip = wgpu * point;
            assert_relative_eq!(clip.x / clip.w, gl_clip.x / gl_clip.w, epsilon = 1e-5);
            assert_relative_eq!(clip.y / clip.w, gl_clip.y / gl_clip.w, epsilon = 1e-5);
            assert_relative_eq!(clip.z / clip.w, (gl_clip.z / gl_clip.w + 1.0) * 0.5, epsilon = 1e-5);
            assert!((0.0..=1.0).contains(&(clip.z / clip.w)));
        }
    }
}
