//! Window, event loop and frame scheduling
//!
//! [`DioramaApp`] owns the winit event loop. Window creation waits for
//! `resumed`, which builds the render engine, the scene context, the UI and
//! kicks off the background asset loads. Every redraw ticks the frame loop,
//! applies finished assets, renders and requests the next redraw.

use std::sync::Arc;
use std::time::Instant;

use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::assets::{AssetLoader, AssetPayload, AssetSlot, LoadedAsset};
use crate::config::DioramaConfig;
use crate::error::Result;
use crate::frame::FrameLoop;
use crate::gfx::rendering::RenderEngine;
use crate::gfx::resources::LightingConfig;
use crate::scene::{PressOutcome, SceneContext};
use crate::ui::{diorama_panel, PanelState, UiAction, UiManager};

const UI_FONT_SIZE: f32 = 18.0;
/// Pixels of touchpad scroll that count as one wheel notch
const PIXELS_PER_SCROLL_LINE: f32 = 50.0;

pub struct DioramaApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

struct AppState {
    config: DioramaConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    context: Option<SceneContext>,
    frame_loop: FrameLoop,
    assets: AssetLoader,
}

impl DioramaApp {
    pub fn new(config: DioramaConfig) -> Result<Self> {
        let event_loop = EventLoop::new()?;
        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                context: None,
                frame_loop: FrameLoop::new(),
                assets: AssetLoader::new(),
            },
        })
    }

    /// Runs until the window is closed or Escape is pressed
    pub fn run(mut self) -> Result<()> {
        self.event_loop.set_control_flow(ControlFlow::Wait);
        self.event_loop.run_app(&mut self.app_state)?;
        Ok(())
    }
}

impl AppState {
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(engine), Some(ctx), Some(window)) =
            (self.render_engine.as_mut(), self.context.as_mut(), self.window.as_ref())
        else {
            return;
        };

        let tick = self.frame_loop.tick(ctx, engine);
        for loaded in self.assets.poll() {
            apply_loaded_asset(loaded, engine, ctx);
        }
        engine.update(tick.camera_uniform);

        let panel_state = PanelState::capture(ctx, self.frame_loop.fps(), self.assets.pending_count())
            .with_renderer(engine.visual_count(), engine.get_shadow_cache_stats());
        let mut action = None;

        let result = match self.ui_manager.as_mut() {
            Some(ui_manager) => engine.render_frame(Some(
                |device: &wgpu::Device,
                 queue: &wgpu::Queue,
                 encoder: &mut wgpu::CommandEncoder,
                 view: &wgpu::TextureView| {
                    ui_manager.draw(device, queue, encoder, window, view, |ui| {
                        action = diorama_panel(ui, &panel_state);
                    });
                },
            )),
            None => engine.render_frame(
                None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
            ),
        };

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => engine.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("Out of GPU memory, exiting");
                event_loop.exit();
                return;
            }
            Err(e) => warn!("Dropped frame: {}", e),
        }

        if action == Some(UiAction::Regenerate) {
            let spawned = ctx.regenerate(engine);
            info!("Regenerated {} entities", spawned);
        }

        window.request_redraw();
    }
}

/// Installs a finished asset into the scene
fn apply_loaded_asset(loaded: LoadedAsset, engine: &mut RenderEngine, ctx: &mut SceneContext) {
    match (loaded.slot, loaded.payload) {
        (AssetSlot::GroundTexture, AssetPayload::Image(image)) => {
            let texture = engine.create_texture(&image.rgba, image.width, image.height, "Ground Texture", true);
            engine.set_visual_texture(ctx.props.ground, texture);
        }
        (AssetSlot::CrateTexture, AssetPayload::Image(image)) => {
            let texture = engine.create_texture(&image.rgba, image.width, image.height, "Crate Texture", false);
            engine.set_visual_texture(ctx.props.crate_box, texture);
        }
        (AssetSlot::Environment, AssetPayload::Image(image)) => {
            engine.set_environment(&image.rgba, image.width, image.height);
        }
        (AssetSlot::Tree, AssetPayload::Model(meshes)) => {
            ctx.attach_tree(
                meshes.into_iter().map(|mesh| (mesh.name, mesh.geometry, mesh.material)),
                engine,
            );
        }
        (slot, _) => warn!("Unexpected payload for {:?} from '{}'", slot, loaded.path.display()),
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(self.config.window.width, self.config.window.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let (width, height) = window.inner_size().into();
        let window_clone = window.clone();
        let shadow_debug = self.config.shadow_debug;
        let engine = pollster::block_on(async move {
            RenderEngine::new(window_clone, width, height, LightingConfig::default(), shadow_debug).await
        });
        let mut engine = match engine {
            Ok(engine) => engine,
            Err(e) => {
                error!("Failed to initialise rendering: {}", e);
                event_loop.exit();
                return;
            }
        };

        let context = SceneContext::new(self.config.clone(), (width, height), &mut engine);
        context.log_summary();

        let ui_manager = UiManager::new(
            engine.device(),
            engine.queue(),
            engine.surface_format(),
            &window,
            UI_FONT_SIZE,
        );

        self.assets.request_scene_assets(&self.config.assets);

        window.request_redraw();
        self.ui_manager = Some(ui_manager);
        self.context = Some(context);
        self.render_engine = Some(engine);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // The UI sees input first; whatever it captures stays away from the scene.
        // A primary release always goes through so a drag cannot get stuck.
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let is_primary_release = matches!(
                event,
                WindowEvent::MouseInput {
                    state: ElementState::Released,
                    button: MouseButton::Left,
                    ..
                }
            );
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) && !is_primary_release {
                window.request_redraw();
                return;
            }
        }

        if matches!(event, WindowEvent::RedrawRequested) {
            self.redraw(event_loop);
            return;
        }

        let (Some(engine), Some(ctx)) = (self.render_engine.as_mut(), self.context.as_mut()) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if key_event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                    && key_event.state == ElementState::Pressed
                {
                    event_loop.exit();
                    return;
                }
                ctx.input.handle_key_event(&key_event);
            }
            WindowEvent::Focused(false) => ctx.input.release_all_keys(),
            WindowEvent::CursorMoved { position, .. } => {
                ctx.handle_pointer_moved((position.x as f32, position.y as f32), engine);
            }
            WindowEvent::CursorLeft { .. } => ctx.handle_pointer_left(),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    if let PressOutcome::Deleted(entity) = ctx.handle_primary_pressed(Instant::now(), engine) {
                        info!("Deleted {} ({})", entity.id, entity.kind.name());
                    }
                }
                ElementState::Released => ctx.handle_primary_released(),
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_SCROLL_LINE,
                };
                // wheel up zooms in
                ctx.handle_scroll(-lines);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                engine.resize(width, height);
                ctx.resize(width, height, engine);
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            _ => (),
        }
    }
}
