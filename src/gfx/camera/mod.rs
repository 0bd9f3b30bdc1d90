pub mod camera_utils;
pub mod fly_camera;
pub mod orbit_controls;

// Re-export main types
pub use camera_utils::{Camera, CameraUniform};
pub use fly_camera::FlyCamera;
pub use orbit_controls::OrbitControls;
