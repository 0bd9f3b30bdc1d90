//! The scene context
//!
//! One [`SceneContext`] holds everything the event handlers and the frame
//! loop mutate: camera, orbit controls, entity registry, interaction
//! gesture, input state and static props. It is created once and passed
//! explicitly; graphics calls go through the `backend` argument.

use std::time::Instant;

use cgmath::Vector2;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::entity::{Entity, EntityId};
use super::props::StaticProps;
use super::registry::EntityRegistry;
use crate::config::DioramaConfig;
use crate::gfx::backend::{MaterialDesc, SceneBackend};
use crate::gfx::camera::{FlyCamera, OrbitControls};
use crate::gfx::geometry::GeometryData;
use crate::gfx::picking::pointer_to_ndc;
use crate::interaction::controller::InteractionController;
use crate::interaction::input::{InputState, PressKind};

/// Result of a primary button press
#[derive(Debug, Clone, PartialEq)]
pub enum PressOutcome {
    Picked(EntityId),
    Deleted(Entity),
    /// Nothing hit; the press starts an orbit
    Orbit,
}

pub struct SceneContext {
    pub config: DioramaConfig,
    pub camera: FlyCamera,
    pub orbit: OrbitControls,
    pub registry: EntityRegistry,
    pub interaction: InteractionController,
    pub input: InputState,
    pub props: StaticProps,
    viewport: (f32, f32),
    rng: StdRng,
}

impl SceneContext {
    /// Builds the scene: props, camera, and the first batch of entities
    pub fn new<B: SceneBackend + ?Sized>(config: DioramaConfig, viewport: (u32, u32), backend: &mut B) -> Self {
        let aspect = viewport.0.max(1) as f32 / viewport.1.max(1) as f32;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut context = Self {
            camera: FlyCamera::new(&config.camera, aspect),
            orbit: OrbitControls::from_config(&config.camera),
            registry: EntityRegistry::new(config.spawn.clone()),
            interaction: InteractionController::new(&config.drag),
            input: InputState::new(),
            props: StaticProps::create(config.drag.ground_size, backend),
            viewport: (viewport.0 as f32, viewport.1 as f32),
            rng,
            config,
        };
        context.interaction.set_occluders(context.props.occluders());
        context.regenerate(backend);
        context
    }

    /// Adds the loaded tree meshes; the tree then hides entities behind it
    pub fn attach_tree<B, I>(&mut self, meshes: I, backend: &mut B)
    where
        B: SceneBackend + ?Sized,
        I: IntoIterator<Item = (String, GeometryData, MaterialDesc)>,
    {
        self.props.attach_tree(meshes, backend);
        self.interaction.set_occluders(self.props.occluders());
    }

    /// Replaces all generated entities with a fresh batch
    pub fn regenerate<B: SceneBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        self.end_gesture();
        let count = self.config.spawn.count;
        self.registry.spawn(count, &mut self.rng, backend).len()
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    pub fn resize<B: SceneBackend + ?Sized>(&mut self, width: u32, height: u32, backend: &mut B) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width as f32, height as f32);
        self.camera.resize_projection(width, height);
        self.camera.update_view_proj();
        backend.mark_shadows_stale();
    }

    fn pointer_ndc(&self) -> Option<Vector2<f32>> {
        pointer_to_ndc(self.input.pointer()?, self.viewport)
    }

    /// Pointer moved to `position` (window pixels)
    pub fn handle_pointer_moved<B: SceneBackend + ?Sized>(&mut self, position: (f32, f32), backend: &mut B) {
        let previous = self.input.pointer();
        self.input.set_pointer(position);

        if self.interaction.is_dragging() {
            if let Some(ndc) = self.pointer_ndc() {
                self.interaction
                    .drag(ndc, &self.camera, &mut self.registry, backend);
            }
        } else if let Some(previous) = previous {
            self.orbit
                .handle_mouse_motion(position.0 - previous.0, position.1 - previous.1);
        }
    }

    /// Primary button down: a double press deletes, a single press picks or orbits
    pub fn handle_primary_pressed<B: SceneBackend + ?Sized>(&mut self, now: Instant, backend: &mut B) -> PressOutcome {
        let kind = self.input.press_primary(now);
        let Some(ndc) = self.pointer_ndc() else {
            return PressOutcome::Orbit;
        };

        if kind == PressKind::Double {
            if let Some(removed) = self
                .interaction
                .delete(ndc, &self.camera, &mut self.registry, backend)
            {
                self.sync_orbit_with_gesture();
                return PressOutcome::Deleted(removed);
            }
        }

        match self.interaction.pick(ndc, &self.camera, &self.registry) {
            Some(id) => {
                self.orbit.set_enabled(false);
                PressOutcome::Picked(id)
            }
            None => {
                self.orbit.set_rotating(true);
                PressOutcome::Orbit
            }
        }
    }

    pub fn handle_primary_released(&mut self) {
        self.input.release_primary();
        self.end_gesture();
    }

    /// Pointer left the window: same as a release
    pub fn handle_pointer_left(&mut self) {
        self.input.pointer_left();
        self.end_gesture();
    }

    pub fn handle_scroll(&mut self, amount: f32) {
        self.orbit.handle_scroll(amount);
    }

    fn end_gesture(&mut self) {
        if self.interaction.is_dragging() {
            debug!("Released {:?}", self.interaction.selected());
        }
        self.interaction.release();
        self.orbit.set_enabled(true);
        self.orbit.set_rotating(false);
    }

    fn sync_orbit_with_gesture(&mut self) {
        if !self.interaction.is_dragging() {
            self.orbit.set_enabled(true);
        }
    }

    pub fn log_summary(&self) {
        info!(
            "Scene: {} entities, camera at ({:.1}, {:.1}, {:.1})",
            self.registry.len(),
            self.camera.eye.x,
            self.camera.eye.y,
            self.camera.eye.z
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::testing::RecordingBackend;
    use cgmath::Vector3;
    use std::time::Duration;

    fn context(backend: &mut RecordingBackend) -> SceneContext {
        let mut config = DioramaConfig::default();
        config.seed = Some(17);
        config.spawn.count = 12;
        SceneContext::new(config, (800, 600), backend)
    }

    /// Keeps only the first entity, off to the side of the props, and aims
    /// the camera at it so the screen center hits it
    fn center_entity(ctx: &mut SceneContext, backend: &mut RecordingBackend) -> EntityId {
        let id = ctx.registry.entities()[0].id;
        let others: Vec<_> = ctx.registry.iter().skip(1).map(|e| e.id).collect();
        for other in others {
            ctx.registry.remove(other, backend);
        }
        let spot = Vector3::new(6.0, 0.5, 0.0);
        ctx.registry.set_position(id, spot, backend);
        ctx.camera.eye = spot + Vector3::new(0.0, 5.0, 10.0);
        ctx.camera.target = spot;
        id
    }

    #[test]
    fn new_context_spawns_configured_batch_and_props() {
        let mut backend = RecordingBackend::new();
        let ctx = context(&mut backend);
        assert_eq!(ctx.registry.len(), 12);
        assert_eq!(backend.live_count(), 12 + 3);
    }

    #[test]
    fn regenerate_keeps_props() {
        let mut backend = RecordingBackend::new();
        let mut ctx = context(&mut backend);
        assert_eq!(ctx.regenerate(&mut backend), 12);
        assert_eq!(backend.live_count(), 15);
        assert!(backend.live.contains_key(&ctx.props.ground));
    }

    #[test]
    fn press_on_entity_picks_and_disables_orbit() {
        let mut backend = RecordingBackend::new();
        let mut ctx = context(&mut backend);
        let id = center_entity(&mut ctx, &mut backend);

        ctx.handle_pointer_moved((400.0, 300.0), &mut backend);
        let outcome = ctx.handle_primary_pressed(Instant::now(), &mut backend);
        assert_eq!(outcome, PressOutcome::Picked(id));
        assert!(!ctx.orbit.is_enabled());

        ctx.handle_primary_released();
        assert!(ctx.interaction.state().is_empty());
        assert!(ctx.orbit.is_enabled());
    }

    #[test]
    fn double_press_deletes_instead_of_picking() {
        let mut backend = RecordingBackend::new();
        let mut ctx = context(&mut backend);
        let id = center_entity(&mut ctx, &mut backend);

        let t0 = Instant::now();
        ctx.handle_pointer_moved((400.0, 300.0), &mut backend);
        ctx.handle_primary_pressed(t0, &mut backend);
        ctx.handle_primary_released();
        let outcome = ctx.handle_primary_pressed(t0 + Duration::from_millis(120), &mut backend);

        assert!(matches!(outcome, PressOutcome::Deleted(ref e) if e.id == id));
        assert!(ctx.registry.is_empty());
        assert!(ctx.interaction.state().is_empty());
    }

    #[test]
    fn press_on_empty_space_orbits() {
        let mut backend = RecordingBackend::new();
        let mut ctx = context(&mut backend);
        ctx.registry.clear(&mut backend);

        ctx.handle_pointer_moved((400.0, 300.0), &mut backend);
        let outcome = ctx.handle_primary_pressed(Instant::now(), &mut backend);
        assert_eq!(outcome, PressOutcome::Orbit);
        assert!(ctx.orbit.is_rotating());
    }

    #[test]
    fn pointer_leave_releases_drag() {
        let mut backend = RecordingBackend::new();
        let mut ctx = context(&mut backend);
        center_entity(&mut ctx, &mut backend);

        ctx.handle_pointer_moved((400.0, 300.0), &mut backend);
        ctx.handle_primary_pressed(Instant::now(), &mut backend);
        assert!(ctx.interaction.is_dragging());

        ctx.handle_pointer_left();
        assert!(ctx.interaction.state().is_empty());
        assert!(!ctx.input.primary_down());
    }

    #[test]
    fn dragging_moves_entity_and_not_camera() {
        let mut backend = RecordingBackend::new();
        let mut ctx = context(&mut backend);
        let id = center_entity(&mut ctx, &mut backend);

        ctx.handle_pointer_moved((400.0, 300.0), &mut backend);
        ctx.handle_primary_pressed(Instant::now(), &mut backend);
        let eye = ctx.camera.eye;
        ctx.handle_pointer_moved((500.0, 350.0), &mut backend);

        assert_ne!(ctx.registry.get(id).unwrap().position, Vector3::new(6.0, 0.5, 0.0));
        assert!(!ctx.orbit.update(&mut ctx.camera));
        assert_eq!(ctx.camera.eye, eye);
    }

    #[test]
    fn resize_updates_aspect_and_invalidates_shadows() {
        let mut backend = RecordingBackend::new();
        let mut ctx = context(&mut backend);
        let before = backend.shadow_invalidations;

        ctx.resize(1600, 800, &mut backend);
        assert_eq!(ctx.viewport(), (1600.0, 800.0));
        assert_eq!(ctx.camera.aspect, 2.0);
        assert_eq!(backend.shadow_invalidations, before + 1);

        ctx.resize(0, 800, &mut backend);
        assert_eq!(ctx.viewport(), (1600.0, 800.0));
        assert_eq!(backend.shadow_invalidations, before + 1);
    }

    #[test]
    fn crate_hides_entity_behind_it() {
        let mut backend = RecordingBackend::new();
        let mut ctx = context(&mut backend);
        let id = center_entity(&mut ctx, &mut backend);
        // directly behind the crate as seen from the default camera
        ctx.registry.set_position(id, Vector3::new(0.0, 0.2, -2.0), &mut backend);
        ctx.camera.eye = Vector3::new(0.0, 5.0, 10.0);
        ctx.camera.target = Vector3::new(0.0, 1.0, 0.0);

        ctx.handle_pointer_moved((400.0, 300.0), &mut backend);
        assert_eq!(ctx.handle_primary_pressed(Instant::now(), &mut backend), PressOutcome::Orbit);
        assert!(ctx.registry.contains(id));
    }
}
