// src/lib.rs
//! Diorama
//!
//! An interactive 3D scene built on wgpu and winit: a field of randomly
//! placed boxes, spheres and cylinders over a textured ground. Fly the
//! camera with the keyboard, orbit by dragging empty space, drag shapes
//! across the ground, double-click to delete them and regenerate the field
//! from the UI.

pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod frame;
pub mod gfx;
pub mod interaction;
pub mod prelude;
pub mod scene;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::DioramaApp;
pub use config::DioramaConfig;
pub use error::{DioramaError, Result};

/// Creates the application with configuration read from the environment
pub fn default() -> Result<DioramaApp> {
    DioramaApp::new(DioramaConfig::from_env()?)
}
