//! # User Interface Module
//!
//! Dear ImGui overlay for the diorama.
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu, input capture
//! - [`panel`] - the "Diorama" panel with scene info and the Regenerate button
//!
//! Pointer and keyboard events the UI captures are not forwarded to the
//! scene, so dragging the panel never orbits the camera.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{diorama_panel, PanelState, UiAction};
