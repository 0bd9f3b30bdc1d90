//! Graphics backend interface
//!
//! The scene logic never talks to wgpu directly. Everything it needs from the
//! graphics side goes through [`SceneBackend`]: add a visual, move it, remove
//! and dispose it, and invalidate the shadow map. [`RenderEngine`] is the real
//! implementation.
//!
//! [`RenderEngine`]: crate::gfx::rendering::RenderEngine

use cgmath::{Matrix4, One, Quaternion, Vector3};

use crate::gfx::geometry::GeometryData;

/// Opaque reference to a visual owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

/// Opaque reference to a texture owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Translation, rotation and scale of a visual
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    /// Composes T * R * S
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Surface description of a visual
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDesc {
    pub base_color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    pub texture: Option<TextureHandle>,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            roughness: 1.0,
            metalness: 0.0,
            texture: None,
        }
    }
}

impl MaterialDesc {
    pub fn from_color(base_color: [f32; 4]) -> Self {
        Self {
            base_color,
            ..Default::default()
        }
    }
}

/// Everything needed to create a visual
#[derive(Debug, Clone)]
pub struct VisualDesc {
    pub label: String,
    pub geometry: GeometryData,
    pub material: MaterialDesc,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// Scene-graph operations consumed by the scene and interaction logic
pub trait SceneBackend {
    /// Adds a visual to the scene graph and allocates its resources
    fn add_visual(&mut self, desc: VisualDesc) -> VisualHandle;

    /// Moves a visual; unknown handles are ignored
    fn set_transform(&mut self, handle: VisualHandle, transform: &Transform);

    /// Removes a visual from the scene graph and releases its resources
    ///
    /// Returns `false` when the handle was already removed, in which case
    /// nothing is released.
    fn remove_visual(&mut self, handle: VisualHandle) -> bool;

    /// Flags the shadow map for regeneration on the next rendered frame
    fn mark_shadows_stale(&mut self);
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory backend that records every call

    use std::collections::{BTreeMap, HashMap};

    use super::*;

    #[derive(Debug, Clone)]
    pub struct RecordedVisual {
        pub label: String,
        pub transform: Transform,
        pub material: MaterialDesc,
    }

    #[derive(Debug, Default)]
    pub struct RecordingBackend {
        next_handle: u64,
        pub live: BTreeMap<VisualHandle, RecordedVisual>,
        pub disposals: HashMap<VisualHandle, u32>,
        pub shadow_invalidations: u32,
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn live_count(&self) -> usize {
            self.live.len()
        }

        pub fn disposal_count(&self, handle: VisualHandle) -> u32 {
            self.disposals.get(&handle).copied().unwrap_or(0)
        }

        pub fn transform_of(&self, handle: VisualHandle) -> Option<Transform> {
            self.live.get(&handle).map(|v| v.transform)
        }
    }

    impl SceneBackend for RecordingBackend {
        fn add_visual(&mut self, desc: VisualDesc) -> VisualHandle {
            self.next_handle += 1;
            let handle = VisualHandle(self.next_handle);
            self.live.insert(
                handle,
                RecordedVisual {
                    label: desc.label,
                    transform: desc.transform,
                    material: desc.material,
                },
            );
            handle
        }

        fn set_transform(&mut self, handle: VisualHandle, transform: &Transform) {
            if let Some(visual) = self.live.get_mut(&handle) {
                visual.transform = *transform;
            }
        }

        fn remove_visual(&mut self, handle: VisualHandle) -> bool {
            if self.live.remove(&handle).is_some() {
                *self.disposals.entry(handle).or_insert(0) += 1;
                true
            } else {
                false
            }
        }

        fn mark_shadows_stale(&mut self) {
            self.shadow_invalidations += 1;
        }
    }
}
