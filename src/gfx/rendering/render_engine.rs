//! WGPU-based rendering engine for the diorama
//!
//! Owns the surface, device and every GPU resource of the scene. Each frame
//! runs up to three passes: the sun's shadow map (only when stale), the main
//! pass (sky first, then the lit visuals) and an optional UI overlay.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, error, info};
use wgpu::TextureFormat;

use crate::error::Result;
use crate::gfx::backend::{SceneBackend, TextureHandle, Transform, VisualDesc, VisualHandle};
use crate::gfx::camera::CameraUniform;
use crate::gfx::resources::{GlobalBindings, GlobalUBO, GlobalUniform, LightingConfig, TextureResource};
use crate::wgpu_utils::{binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};

use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::shadow_cache::{ShadowCache, ShadowCacheStats};
use super::visual::{DrawVisual, GpuVisual};

const SCENE_SHADER: &str = concat!(include_str!("globals.wgsl"), include_str!("scene.wgsl"));
const SHADOW_SHADER: &str = concat!(include_str!("globals.wgsl"), include_str!("shadow.wgsl"));
const SKY_SHADER: &str = concat!(include_str!("globals.wgsl"), include_str!("sky.wgsl"));

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pipeline_manager: PipelineManager,

    lighting: LightingConfig,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,

    object_layout: BindGroupLayoutWithDesc,
    scene_layout: BindGroupLayoutWithDesc,
    scene_bind_group: wgpu::BindGroup,

    shadow_map: TextureResource,
    shadow_cache: ShadowCache,
    environment: Option<TextureResource>,
    white_texture: TextureResource,

    textures: HashMap<TextureHandle, TextureResource>,
    visuals: BTreeMap<VisualHandle, GpuVisual>,
    next_texture: u64,
    next_visual: u64,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Fails when no surface, adapter or device can be obtained.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        lighting: LightingConfig,
        shadow_debug: bool,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        // Shaders do their own gamma, so prefer a linear surface
        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let shadow_map = TextureResource::create_shadow_map(&device, lighting.sun.shadow_map_size);
        let white_texture = TextureResource::create_white(&device, &queue);

        let global_ubo = GlobalUBO::new_with_data(
            &device,
            &GlobalUniform::new(&CameraUniform::default(), &lighting, false),
        );
        let global_bindings = GlobalBindings::new(&device, &global_ubo);

        let object_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(&device, "Object Bind Group Layout");

        let scene_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::depth_texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(&device, "Scene Textures Bind Group Layout");

        let scene_bind_group = Self::create_scene_bind_group(&device, &scene_layout, &shadow_map, &white_texture);

        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader("scene", SCENE_SHADER);
        pipeline_manager.load_shader("shadow", SHADOW_SHADER);
        pipeline_manager.load_shader("sky", SKY_SHADER);

        let globals_layout = global_bindings.bind_group_layout().clone();

        pipeline_manager.register_pipeline(
            "Shadow",
            PipelineConfig::default()
                .with_label("Shadow Pipeline")
                .with_shader("shadow")
                .with_vertex_only()
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![globals_layout.clone(), object_layout.layout.clone()])
                .with_depth(TextureResource::DEPTH_FORMAT, true, wgpu::CompareFunction::LessEqual)
                .with_depth_bias(wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                }),
        );

        pipeline_manager.register_pipeline(
            "Sky",
            PipelineConfig::default()
                .with_label("Sky Pipeline")
                .with_shader("sky")
                .with_no_vertex_buffers()
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![globals_layout.clone(), scene_layout.layout.clone()])
                .with_depth(TextureResource::DEPTH_FORMAT, false, wgpu::CompareFunction::Always)
                .with_color_format(format),
        );

        pipeline_manager.register_pipeline(
            "Scene",
            PipelineConfig::default()
                .with_label("Scene Pipeline")
                .with_shader("scene")
                .with_bind_group_layouts(vec![
                    globals_layout,
                    object_layout.layout.clone(),
                    scene_layout.layout.clone(),
                ])
                .with_depth(TextureResource::DEPTH_FORMAT, true, wgpu::CompareFunction::Less)
                .with_color_format(format),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for e in errors {
                error!("{}", e);
            }
        }
        debug!("Pipelines: {:?}", pipeline_manager.get_stats());

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            format,
            pipeline_manager,
            lighting,
            global_ubo,
            global_bindings,
            object_layout,
            scene_layout,
            scene_bind_group,
            shadow_map,
            shadow_cache: ShadowCache::new(shadow_debug),
            environment: None,
            white_texture,
            textures: HashMap::new(),
            visuals: BTreeMap::new(),
            next_texture: 0,
            next_visual: 0,
        })
    }

    fn create_scene_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        shadow_map: &TextureResource,
        environment: &TextureResource,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .texture(&shadow_map.view)
            .sampler(&shadow_map.sampler)
            .texture(&environment.view)
            .sampler(&environment.sampler)
            .create(device, "Scene Textures Bind Group")
    }

    /// Uploads sRGB RGBA8 pixels and returns a handle materials can refer to
    pub fn create_texture(&mut self, rgba: &[u8], width: u32, height: u32, label: &str, repeat: bool) -> TextureHandle {
        let address_mode = if repeat {
            wgpu::AddressMode::Repeat
        } else {
            wgpu::AddressMode::ClampToEdge
        };
        let texture =
            TextureResource::create_from_rgba_data(&self.device, &self.queue, rgba, width, height, label, address_mode);

        let handle = TextureHandle(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(handle, texture);
        handle
    }

    /// Binds a texture to an existing visual
    ///
    /// Returns `false` when either handle is unknown.
    pub fn set_visual_texture(&mut self, visual: VisualHandle, texture: TextureHandle) -> bool {
        let (Some(gpu_visual), Some(resource)) = (self.visuals.get_mut(&visual), self.textures.get(&texture)) else {
            return false;
        };
        gpu_visual.set_texture(&self.device, &self.queue, &self.object_layout, texture, resource);
        true
    }

    /// Installs an equirectangular environment map used for the sky and ambient tint
    pub fn set_environment(&mut self, rgba: &[u8], width: u32, height: u32) {
        let environment = TextureResource::create_from_rgba_data(
            &self.device,
            &self.queue,
            rgba,
            width,
            height,
            "Environment",
            wgpu::AddressMode::Repeat,
        );
        self.scene_bind_group =
            Self::create_scene_bind_group(&self.device, &self.scene_layout, &self.shadow_map, &environment);
        self.environment = Some(environment);
        info!("Environment map installed ({}x{})", width, height);
    }

    pub fn has_environment(&self) -> bool {
        self.environment.is_some()
    }

    /// Uploads camera, light and fog uniforms for the next frame
    pub fn update(&mut self, camera_uniform: CameraUniform) {
        let content = GlobalUniform::new(&camera_uniform, &self.lighting, self.environment.is_some());
        self.global_ubo.update_content(&self.queue, content);
    }

    pub fn lighting(&self) -> &LightingConfig {
        &self.lighting
    }

    /// Renders a frame with an optional UI overlay
    pub fn render_frame<F>(&mut self, ui_callback: Option<F>) -> std::result::Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = self.surface.get_current_texture()?;
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        if self.shadow_cache.needs_update() {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(shadow_pipeline) = self.pipeline_manager.get_pipeline("Shadow") {
                shadow_pass.set_pipeline(shadow_pipeline);
                shadow_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
                for visual in self.visuals.values().filter(|v| v.cast_shadow) {
                    shadow_pass.draw_visual(visual);
                }
            }
            drop(shadow_pass);
            self.shadow_cache.mark_valid();
        }

        {
            let fog = self.lighting.fog.color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: fog[0] as f64,
                            g: fog[1] as f64,
                            b: fog[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let Some(sky_pipeline) = self.pipeline_manager.get_pipeline("Sky") {
                render_pass.set_pipeline(sky_pipeline);
                render_pass.set_bind_group(1, &self.scene_bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Scene") {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(2, &self.scene_bind_group, &[]);
                for visual in self.visuals.values() {
                    render_pass.draw_visual(visual);
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_texture_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Resizes the surface and recreates the depth buffer
    ///
    /// Zero-sized requests (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
        self.shadow_cache.invalidate();
    }

    /// Reconfigures the surface after it was lost or became outdated
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    pub fn get_shadow_cache_stats(&self) -> ShadowCacheStats {
        self.shadow_cache.get_stats()
    }
}

impl SceneBackend for RenderEngine {
    fn add_visual(&mut self, desc: VisualDesc) -> VisualHandle {
        let texture = desc
            .material
            .texture
            .and_then(|handle| self.textures.get(&handle))
            .unwrap_or(&self.white_texture);
        let visual = GpuVisual::new(&self.device, &self.object_layout, desc, texture);

        let handle = VisualHandle(self.next_visual);
        self.next_visual += 1;
        debug!("Added visual '{}' as {:?}", visual.label, handle);
        self.visuals.insert(handle, visual);
        handle
    }

    fn set_transform(&mut self, handle: VisualHandle, transform: &Transform) {
        if let Some(visual) = self.visuals.get_mut(&handle) {
            visual.set_transform(&self.queue, *transform);
        }
    }

    fn remove_visual(&mut self, handle: VisualHandle) -> bool {
        match self.visuals.remove(&handle) {
            Some(visual) => {
                debug!("Disposing visual '{}' ({:?})", visual.label, handle);
                visual.destroy();
                true
            }
            None => false,
        }
    }

    fn mark_shadows_stale(&mut self) {
        self.shadow_cache.invalidate();
    }
}
