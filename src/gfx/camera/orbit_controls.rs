use cgmath::{InnerSpace, Vector3};
use std::f32::consts::PI;

use super::fly_camera::FlyCamera;
use crate::config::CameraConfig;

const MIN_POLAR: f32 = 0.01;
const MIN_RADIUS: f32 = 0.1;
const SETTLE_EPSILON: f32 = 1e-5;

/// Mouse orbit and zoom around the camera target, with damping
///
/// Rotation input accumulates into a pending spherical delta. Every
/// [`update`](Self::update) applies `damping_factor` of it and keeps the rest,
/// so the camera eases out after the mouse stops.
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub damping_factor: f32,
    enabled: bool,
    is_rotating: bool,
    pending_azimuth: f32,
    pending_polar: f32,
    pending_zoom: f32,
}

impl OrbitControls {
    pub fn new(rotate_speed: f32, zoom_speed: f32, damping_factor: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            damping_factor: damping_factor.clamp(f32::EPSILON, 1.0),
            enabled: true,
            is_rotating: false,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_zoom: 1.0,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.rotate_speed, config.zoom_speed, config.damping_factor)
    }

    /// Disabled controls ignore input but still settle pending motion
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.is_rotating = false;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Starts or stops a rotate gesture (primary button on empty space)
    pub fn set_rotating(&mut self, rotating: bool) {
        self.is_rotating = rotating && self.enabled;
    }

    pub fn is_rotating(&self) -> bool {
        self.is_rotating
    }

    pub fn handle_mouse_motion(&mut self, dx: f32, dy: f32) {
        if !self.enabled || !self.is_rotating {
            return;
        }
        self.pending_azimuth -= dx * self.rotate_speed;
        self.pending_polar -= dy * self.rotate_speed;
    }

    /// Positive amounts zoom out, negative zoom in
    pub fn handle_scroll(&mut self, amount: f32) {
        if !self.enabled {
            return;
        }
        self.pending_zoom *= (1.0 + self.zoom_speed).powf(amount);
    }

    /// Applies the damped motion to the camera; returns whether it moved
    pub fn update(&mut self, camera: &mut FlyCamera) -> bool {
        let offset = camera.eye - camera.target;
        let radius = offset.magnitude();
        if radius <= f32::EPSILON {
            return false;
        }

        let azimuth = offset.x.atan2(offset.z);
        let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let d_azimuth = self.pending_azimuth * self.damping_factor;
        let d_polar = self.pending_polar * self.damping_factor;
        let zoom = self.pending_zoom;

        self.pending_azimuth -= d_azimuth;
        self.pending_polar -= d_polar;
        self.pending_zoom = 1.0;

        let moved = d_azimuth.abs() > SETTLE_EPSILON
            || d_polar.abs() > SETTLE_EPSILON
            || (zoom - 1.0).abs() > SETTLE_EPSILON;
        if !moved {
            self.pending_azimuth = 0.0;
            self.pending_polar = 0.0;
            return false;
        }

        let azimuth = azimuth + d_azimuth;
        let polar = (polar + d_polar).clamp(MIN_POLAR, PI - MIN_POLAR);
        let radius = (radius * zoom).clamp(MIN_RADIUS, camera.zfar);

        camera.eye = camera.target
            + Vector3::new(
                radius * polar.sin() * azimuth.sin(),
                radius * polar.cos(),
                radius * polar.sin() * azimuth.cos(),
            );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DioramaConfig;
    use approx::assert_relative_eq;

    fn camera() -> FlyCamera {
        FlyCamera::new(&DioramaConfig::default().camera, 1.5)
    }

    #[test]
    fn idle_controls_leave_camera_alone() {
        let mut camera = camera();
        let before = camera.eye;
        let mut controls = OrbitControls::new(0.005, 0.05, 0.05);
        assert!(!controls.update(&mut camera));
        assert_eq!(camera.eye, before);
    }

    #[test]
    fn rotation_preserves_distance_to_target() {
        let mut camera = camera();
        let distance = (camera.eye - camera.target).magnitude();
        let mut controls = OrbitControls::new(0.005, 0.05, 0.05);
        controls.set_rotating(true);
        controls.handle_mouse_motion(120.0, -40.0);

        for _ in 0..10 {
            controls.update(&mut camera);
        }
        assert_relative_eq!((camera.eye - camera.target).magnitude(), distance, epsilon = 1e-3);
    }

    #[test]
    fn damping_eases_out() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(0.01, 0.05, 0.5);
        controls.set_rotating(true);
        controls.handle_mouse_motion(100.0, 0.0);

        let start = camera.eye;
        controls.update(&mut camera);
        let first_step = (camera.eye - start).magnitude();
        let mid = camera.eye;
        controls.update(&mut camera);
        let second_step = (camera.eye - mid).magnitude();

        assert!(first_step > 0.0);
        assert!(second_step < first_step);
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let mut camera = camera();
        let before = camera.eye;
        let mut controls = OrbitControls::new(0.005, 0.05, 0.05);
        controls.set_enabled(false);
        controls.set_rotating(true);
        controls.handle_mouse_motion(100.0, 100.0);
        controls.handle_scroll(3.0);
        assert!(!controls.update(&mut camera));
        assert_eq!(camera.eye, before);
    }

    #[test]
    fn scrolling_changes_distance() {
        let mut camera = camera();
        let distance = (camera.eye - camera.target).magnitude();
        let mut controls = OrbitControls::new(0.005, 0.1, 0.05);
        controls.handle_scroll(-2.0);
        assert!(controls.update(&mut camera));
        assert!((camera.eye - camera.target).magnitude() < distance);
    }
}
