//! # Diorama Prelude
//!
//! Commonly used types in one import.
//!
//! ```no_run
//! use diorama::prelude::*;
//!
//! fn main() -> diorama::Result<()> {
//!     let mut config = DioramaConfig::default();
//!     config.spawn.count = 40;
//!     DioramaApp::new(config)?.run()
//! }
//! ```

// Application and configuration
pub use crate::app::DioramaApp;
pub use crate::config::{AssetConfig, CameraConfig, DioramaConfig, DragConfig, SpawnConfig};
pub use crate::error::{DioramaError, Result};

// Scene and interaction
pub use crate::frame::FrameLoop;
pub use crate::interaction::{InputState, InteractionController, MovementKey};
pub use crate::scene::{Entity, EntityId, EntityRegistry, SceneContext, ShapeKind};

// Graphics seam
pub use crate::gfx::backend::{MaterialDesc, SceneBackend, Transform, VisualDesc, VisualHandle};
pub use crate::gfx::camera::FlyCamera;
pub use crate::gfx::picking::{pick_nearest, ray_from_ndc, Ray};
pub use crate::gfx::rendering::RenderEngine;
