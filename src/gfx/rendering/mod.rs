//! Core rendering functionality
//!
//! Handles render pipelines, per-visual GPU resources, shadow caching and
//! frame rendering.

pub mod pipeline_manager;
pub mod render_engine;
pub mod shadow_cache;
pub mod vertex;
pub mod visual;

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::RenderEngine;
pub use shadow_cache::{ShadowCache, ShadowCacheStats};
pub use vertex::Vertex3D;
