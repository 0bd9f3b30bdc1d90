//! Pick, drag, release and delete of registry entities
//!
//! Only registry entities are pickable. Dragging follows the pointer's hit on
//! the ground plane while keeping the entity's height, and eases toward it
//! by the configured smoothing factor on every pointer move.

use cgmath::{Vector2, Vector3, Zero};
use log::{debug, info};

use crate::config::DragConfig;
use crate::gfx::backend::SceneBackend;
use crate::gfx::camera::FlyCamera;
use crate::gfx::picking::{pick_nearest, ray_from_ndc, unoccluded, GroundPlane, Occluder, PickResult, Ray};
use crate::scene::entity::{Entity, EntityId};
use crate::scene::registry::EntityRegistry;

/// Current gesture; empty when nothing is grabbed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionState {
    pub selected: Option<EntityId>,
    pub dragging: bool,
    /// Hit point minus entity position at grab time
    pub grab_offset: Vector3<f32>,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            selected: None,
            dragging: false,
            grab_offset: Vector3::zero(),
        }
    }
}

impl InteractionState {
    pub fn is_empty(&self) -> bool {
        self.selected.is_none() && !self.dragging
    }
}

pub struct InteractionController {
    state: InteractionState,
    ground: GroundPlane,
    smoothing: f32,
    /// Props that hide entities behind them
    occluders: Vec<Occluder>,
}

impl InteractionController {
    pub fn new(config: &DragConfig) -> Self {
        Self {
            state: InteractionState::default(),
            ground: GroundPlane::new(0.0, config.ground_size),
            smoothing: config.smoothing.clamp(f32::EPSILON, 1.0),
            occluders: Vec::new(),
        }
    }

    pub fn set_occluders(&mut self, occluders: Vec<Occluder>) {
        self.occluders = occluders;
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state.dragging
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.state.selected
    }

    pub fn ground(&self) -> &GroundPlane {
        &self.ground
    }

    /// Grabs the nearest entity under the pointer
    pub fn pick(&mut self, ndc: Vector2<f32>, camera: &FlyCamera, registry: &EntityRegistry) -> Option<EntityId> {
        let ray = ray_from_ndc(ndc, camera);
        self.pick_with_ray(Some(&ray), registry)
    }

    /// Grabs the nearest entity hit by `ray`; a missing ray or a miss changes nothing
    pub fn pick_with_ray(&mut self, ray: Option<&Ray>, registry: &EntityRegistry) -> Option<EntityId> {
        let hit = self.nearest_entity(ray?, registry)?;
        let entity = registry.get(hit.key)?;

        self.state = InteractionState {
            selected: Some(hit.key),
            dragging: true,
            grab_offset: hit.point - entity.position,
        };
        debug!("Picked {} {} at distance {:.2}", entity.kind.name(), hit.key, hit.distance);
        Some(hit.key)
    }

    /// Moves the dragged entity toward the pointer's ground hit
    ///
    /// Returns `true` when the entity moved.
    pub fn drag<B>(
        &mut self,
        ndc: Vector2<f32>,
        camera: &FlyCamera,
        registry: &mut EntityRegistry,
        backend: &mut B,
    ) -> bool
    where
        B: SceneBackend + ?Sized,
    {
        if !self.state.dragging {
            return false;
        }
        let ray = ray_from_ndc(ndc, camera);
        self.drag_with_ray(&ray, registry, backend)
    }

    pub fn drag_with_ray<B>(&mut self, ray: &Ray, registry: &mut EntityRegistry, backend: &mut B) -> bool
    where
        B: SceneBackend + ?Sized,
    {
        if !self.state.dragging {
            return false;
        }

        let Some(id) = self.state.selected else {
            self.release();
            return false;
        };
        let Some(position) = registry.get(id).map(|e| e.position) else {
            self.release();
            return false;
        };
        let Some(hit) = self.ground.intersect(ray) else {
            return false;
        };

        let target = drag_target(position, hit);
        let next = position + (target - position) * self.smoothing;
        registry.set_position(id, next, backend);
        backend.mark_shadows_stale();
        true
    }

    /// Ends the gesture; safe to call at any time
    pub fn release(&mut self) {
        self.state = InteractionState::default();
    }

    /// Deletes the nearest entity under the pointer, whatever the drag state
    pub fn delete<B>(
        &mut self,
        ndc: Vector2<f32>,
        camera: &FlyCamera,
        registry: &mut EntityRegistry,
        backend: &mut B,
    ) -> Option<Entity>
    where
        B: SceneBackend + ?Sized,
    {
        let ray = ray_from_ndc(ndc, camera);
        self.delete_with_ray(&ray, registry, backend)
    }

    pub fn delete_with_ray<B>(&mut self, ray: &Ray, registry: &mut EntityRegistry, backend: &mut B) -> Option<Entity>
    where
        B: SceneBackend + ?Sized,
    {
        let hit = self.nearest_entity(ray, registry)?;
        let removed = registry.remove(hit.key, backend)?;
        if self.state.selected == Some(removed.id) {
            self.release();
        }
        info!("Deleted {} {}", removed.kind.name(), removed.id);
        Some(removed)
    }

    /// Nearest entity on the ray, unless a prop is in the way
    fn nearest_entity(&self, ray: &Ray, registry: &EntityRegistry) -> Option<PickResult<EntityId>> {
        let hit = pick_nearest(ray, registry.iter().map(|e| (e.id, e.position, e.collider())))?;
        let key = hit.key;
        let visible = unoccluded(ray, hit, &self.occluders);
        if visible.is_none() {
            debug!("{} is hidden behind a prop", key);
        }
        visible
    }
}

/// Ground hit lifted to the entity's current height
fn drag_target(position: Vector3<f32>, ground_hit: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(ground_hit.x, position.y, ground_hit.z)
}
