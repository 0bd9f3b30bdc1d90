//! Pointer and keyboard interaction with the scene

pub mod controller;
pub mod input;
pub mod movement;

pub use controller::{InteractionController, InteractionState};
pub use input::{ClickTracker, InputState, MovementKey, PressKind};
pub use movement::{apply_camera_movement, MovementOutcome};
