//! Global uniform bindings for camera, lights and fog
//!
//! Everything shared by all draws in a frame lives in one uniform buffer
//! bound at group 0. The layout of [`GlobalUniform`] MUST match the
//! `Globals` struct in the shaders.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

use crate::gfx::camera::fly_camera::OPENGL_TO_WGPU_MATRIX;
use crate::gfx::camera::CameraUniform;
use crate::wgpu_utils::{binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc, UniformBuffer};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// xyz: unit vector toward the sun, w: intensity
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    /// xyz: position, w: range
    pub spot_position: [f32; 4],
    /// xyz: unit direction, w: cosine of the cone angle
    pub spot_direction: [f32; 4],
    /// rgb: color, w: intensity
    pub spot_color: [f32; 4],
    /// x: cosine of the penumbra start, y: decay exponent
    pub spot_params: [f32; 4],
    /// rgb: ambient color times intensity, w: 1 when an environment map is bound
    pub ambient: [f32; 4],
    pub fog_color: [f32; 4],
    /// x: near, y: far
    pub fog_range: [f32; 4],
}

/// Directional light casting the shadow map
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SunLight {
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    pub color: [f32; 3],
    pub intensity: f32,
    /// Half size of the orthographic shadow volume
    pub shadow_extent: f32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    pub shadow_map_size: u32,
}

impl SunLight {
    pub fn view_proj(&self) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(
            Point3::from_vec(self.position),
            Point3::from_vec(self.target),
            Vector3::unit_y(),
        );
        let e = self.shadow_extent;
        OPENGL_TO_WGPU_MATRIX * cgmath::ortho(-e, e, -e, e, self.shadow_near, self.shadow_far) * view
    }
}

/// Cone light; contributes lighting only
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    pub color: [f32; 3],
    pub intensity: f32,
    pub range: f32,
    /// Half-angle of the cone, radians
    pub angle: f32,
    /// Fraction of the cone that fades out, 0..1
    pub penumbra: f32,
    pub decay: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub near: f32,
    pub far: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightingConfig {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub sun: SunLight,
    pub spot: SpotLight,
    pub fog: Fog,
}

impl Default for LightingConfig {
    fn default() -> Self {
        let fog_gray = srgb_to_linear(0xaa as f32 / 255.0);
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.4,
            sun: SunLight {
                position: Vector3::new(5.0, 10.0, 5.0),
                target: Vector3::new(0.0, 0.0, 0.0),
                color: [1.0, 1.0, 1.0],
                intensity: 1.2,
                shadow_extent: 25.0,
                shadow_near: 0.5,
                shadow_far: 50.0,
                shadow_map_size: 2048,
            },
            spot: SpotLight {
                position: Vector3::new(4.0, 5.0, 4.0),
                target: Vector3::new(0.0, 4.0, 0.0),
                color: [1.0, 0.0, 0.0],
                intensity: 5000.0,
                range: 30.0,
                angle: std::f32::consts::FRAC_PI_6,
                penumbra: 0.5,
                decay: 2.0,
            },
            fog: Fog {
                color: [fog_gray, fog_gray, fog_gray],
                near: 5.0,
                far: 30.0,
            },
        }
    }
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl GlobalUniform {
    pub fn new(camera: &CameraUniform, lighting: &LightingConfig, has_environment: bool) -> Self {
        let sun = &lighting.sun;
        let to_sun = (sun.position - sun.target).normalize();
        let spot = &lighting.spot;
        let spot_dir = (spot.target - spot.position).normalize();
        let ambient = lighting.ambient_color.map(|c| c * lighting.ambient_intensity);

        Self {
            view_proj: camera.view_proj,
            inv_view_proj: camera.inv_view_proj,
            light_view_proj: sun.view_proj().into(),
            camera_position: camera.view_position,
            sun_direction: [to_sun.x, to_sun.y, to_sun.z, sun.intensity],
            sun_color: [sun.color[0], sun.color[1], sun.color[2], 1.0],
            spot_position: [spot.position.x, spot.position.y, spot.position.z, spot.range],
            spot_direction: [spot_dir.x, spot_dir.y, spot_dir.z, spot.angle.cos()],
            spot_color: [spot.color[0], spot.color[1], spot.color[2], spot.intensity],
            spot_params: [(spot.angle * (1.0 - spot.penumbra)).cos(), spot.decay, 0.0, 0.0],
            ambient: [ambient[0], ambient[1], ambient[2], if has_environment { 1.0 } else { 0.0 }],
            fog_color: [lighting.fog.color[0], lighting.fog.color[1], lighting.fog.color[2], 1.0],
            fog_range: [lighting.fog.near, lighting.fog.far, 0.0, 0.0],
        }
    }
}

pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Bind group layout and bind group for the global uniforms (group 0)
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Globals Bind Group");

        Self {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Vector4;

    #[test]
    fn sun_frustum_covers_scene_center() {
        let lighting = LightingConfig::default();
        let clip = lighting.sun.view_proj() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        assert!((0.0..=1.0).contains(&ndc.z));

        // ground corners are inside too
        for corner in [Vector4::new(15.0, 0.0, -15.0, 1.0), Vector4::new(-15.0, 0.0, 15.0, 1.0)] {
            let clip = lighting.sun.view_proj() * corner;
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
            assert!((0.0..=1.0).contains(&ndc.z));
        }
    }

    #[test]
    fn spot_cone_cosines_are_ordered() {
        let uniform = GlobalUniform::new(&CameraUniform::default(), &LightingConfig::default(), false);
        let cos_outer = uniform.spot_direction[3];
        let cos_inner = uniform.spot_params[0];
        assert!(cos_inner > cos_outer);
        assert_relative_eq!(cos_outer, (std::f32::consts::FRAC_PI_6).cos());
        assert_eq!(uniform.ambient[3], 0.0);
        assert_relative_eq!(uniform.ambient[0], 0.4);
    }

    #[test]
    fn fog_gray_is_linearized() {
        let lighting = LightingConfig::default();
        assert!(lighting.fog.color[0] > 0.39 && lighting.fog.color[0] < 0.41);
    }
}
