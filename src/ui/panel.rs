// src/ui/panel.rs
//! The "Diorama" control panel
//!
//! Shows what is in the scene and how to drive it, and offers the
//! Regenerate button. The panel only reports what was clicked; the app
//! applies the action.

use crate::gfx::rendering::ShadowCacheStats;
use crate::interaction::input::{DOUBLE_CLICK_DISTANCE, DOUBLE_CLICK_INTERVAL};
use crate::scene::{EntityId, SceneContext};

/// Something the user asked for through the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Regenerate,
}

/// Snapshot of the scene shown in the panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub entity_count: usize,
    pub spawn_count: usize,
    pub selected: Option<EntityId>,
    pub dragging: bool,
    pub camera_position: [f32; 3],
    pub fps: f32,
    pub pending_assets: usize,
    /// Live GPU visuals, props included
    pub visuals: usize,
    pub shadows: Option<ShadowCacheStats>,
}

impl PanelState {
    pub fn capture(ctx: &SceneContext, fps: f32, pending_assets: usize) -> Self {
        let eye = ctx.camera.eye;
        Self {
            entity_count: ctx.registry.len(),
            spawn_count: ctx.config.spawn.count,
            selected: ctx.interaction.selected(),
            dragging: ctx.interaction.is_dragging(),
            camera_position: [eye.x, eye.y, eye.z],
            fps,
            pending_assets,
            visuals: 0,
            shadows: None,
        }
    }

    /// Adds the renderer's counters
    pub fn with_renderer(mut self, visuals: usize, shadows: ShadowCacheStats) -> Self {
        self.visuals = visuals;
        self.shadows = Some(shadows);
        self
    }

    pub fn selection_label(&self) -> String {
        match (self.selected, self.dragging) {
            (Some(id), true) => format!("{} (dragging)", id),
            (Some(id), false) => id.to_string(),
            (None, _) => "none".to_string(),
        }
    }
}

const KEY_BINDINGS: &[(&str, &str)] = &[
    ("W / S", "forward / back"),
    ("A / D", "left / right"),
    ("Space / C", "up / down"),
    ("Q / E", "slow strafe"),
    ("Drag shape", "move it on the ground"),
    ("Drag empty", "orbit camera"),
    ("Wheel", "zoom"),
    ("Esc", "quit"),
];

/// Draws the panel and returns the action the user triggered, if any
pub fn diorama_panel(ui: &imgui::Ui, state: &PanelState) -> Option<UiAction> {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return None;
    }

    let mut action = None;

    ui.window("Diorama")
        .size([320.0, 380.0], imgui::Condition::FirstUseEver)
        .position([20.0, 20.0], imgui::Condition::FirstUseEver)
        .resizable(true)
        .collapsible(true)
        .build(|| {
            ui.text(format!("Entities: {} / {}", state.entity_count, state.spawn_count));
            ui.text(format!("Selected: {}", state.selection_label()));
            let [x, y, z] = state.camera_position;
            ui.text(format!("Camera: ({:.1}, {:.1}, {:.1})", x, y, z));
            ui.text(format!("FPS: {:.0}", state.fps));
            if let Some(shadows) = state.shadows {
                ui.text(format!("Visuals: {}", state.visuals));
                ui.text(format!(
                    "Shadow maps: {} drawn, {} reused",
                    shadows.regenerations, shadows.reuses
                ));
            }
            if state.pending_assets > 0 {
                ui.text_disabled(format!("Loading {} assets...", state.pending_assets));
            }

            ui.separator();
            if ui.button("Regenerate") {
                action = Some(UiAction::Regenerate);
            }

            ui.separator();
            ui.text("Controls");
            for (keys, effect) in KEY_BINDINGS {
                ui.bullet_text(format!("{}: {}", keys, effect));
            }
            ui.bullet_text(format!(
                "Double-click shape: delete ({} ms, {} px)",
                DOUBLE_CLICK_INTERVAL.as_millis(),
                DOUBLE_CLICK_DISTANCE
            ));
        });

    action
}
