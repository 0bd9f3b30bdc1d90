use cgmath::{InnerSpace, Vector3, Zero};

use super::input::{InputState, MovementKey};
use crate::config::CameraConfig;
use crate::gfx::camera::FlyCamera;

/// What one movement step did to the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementOutcome {
    pub moved: bool,
    /// The look target was re-pinned in front of the camera
    pub repinned: bool,
}

/// Horizontal forward and right vectors for keyboard movement
///
/// Forward is the look direction flattened onto the ground, falling back to
/// -Z when the camera looks straight up or down.
pub fn movement_basis(camera: &FlyCamera) -> (Vector3<f32>, Vector3<f32>) {
    let look = camera.look_direction();
    let flat = Vector3::new(look.x, 0.0, look.z);
    let forward = if flat.magnitude2() <= 1e-8 {
        -Vector3::unit_z()
    } else {
        flat.normalize()
    };
    let right = forward.cross(Vector3::unit_y()).normalize();
    (forward, right)
}

/// Applies one frame of keyboard movement
///
/// The look target is re-pinned one unit ahead of the camera on every frame
/// unless a strafe key is held, idle frames included.
pub fn apply_camera_movement(
    camera: &mut FlyCamera,
    input: &InputState,
    config: &CameraConfig,
) -> MovementOutcome {
    let (forward, right) = movement_basis(camera);
    let up = Vector3::unit_y();
    let speed = config.move_speed;
    let strafe_speed = speed * config.strafe_factor;

    let mut delta = Vector3::zero();
    let mut strafing = false;
    for key in input.pressed_keys() {
        delta += match key {
            MovementKey::Forward => forward * speed,
            MovementKey::Backward => -forward * speed,
            MovementKey::Left => -right * speed,
            MovementKey::Right => right * speed,
            MovementKey::Up => up * speed,
            MovementKey::Down => -up * speed,
            MovementKey::StrafeRight => right * strafe_speed,
            MovementKey::StrafeLeft => -right * strafe_speed,
        };
        strafing |= !key.is_primary();
    }

    camera.eye += delta;
    if !strafing {
        camera.target = camera.eye + forward;
    }

    MovementOutcome {
        moved: input.any_movement(),
        repinned: !strafing,
    }
}
