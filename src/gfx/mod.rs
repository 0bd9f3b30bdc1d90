//! # Graphics Module
//!
//! Everything between the scene logic and the GPU.
//!
//! - **Backend seam** ([`backend`]) - the [`SceneBackend`] trait the scene logic drives
//! - **Camera** ([`camera`]) - perspective camera and damped orbit controls
//! - **Geometry** ([`geometry`]) - procedural meshes for the entity shapes and ground
//! - **Picking** ([`picking`]) - pointer rays and analytic ray/shape intersection
//! - **Rendering** ([`rendering`]) - wgpu engine with a cached sun shadow map
//! - **Resources** ([`resources`]) - global uniforms, lights and textures
//!
//! [`SceneBackend`]: backend::SceneBackend

pub mod backend;
pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;

// Re-export commonly used types
pub use backend::{MaterialDesc, SceneBackend, TextureHandle, Transform, VisualDesc, VisualHandle};
pub use camera::FlyCamera;
pub use rendering::render_engine::RenderEngine;
