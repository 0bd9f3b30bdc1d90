//! Error types for the Diorama crate
//!
//! Only resource and startup faults are errors. Ray misses, deletes of absent
//! entities and failed background loads are silent no-ops and never show up here.

use std::path::PathBuf;

/// Errors produced while configuring, loading assets, or starting the GPU and window
#[derive(Debug, thiserror::Error)]
pub enum DioramaError {
    #[error("failed to read asset '{path}': {source}")]
    AssetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load model '{path}': {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model '{path}' contains no meshes")]
    EmptyModel { path: PathBuf },

    #[error("invalid value '{value}' for {key}")]
    Config { key: &'static str, value: String },

    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to acquire graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

pub type Result<T> = std::result::Result<T, DioramaError>;
