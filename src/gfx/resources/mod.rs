pub mod global_bindings;
pub mod texture_resource;

pub use global_bindings::{GlobalBindings, GlobalUBO, GlobalUniform, LightingConfig};
pub use texture_resource::TextureResource;
