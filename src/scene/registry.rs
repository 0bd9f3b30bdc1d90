//! Registry of the generated, pickable entities
//!
//! Every mutation goes through the [`SceneBackend`] in the same call, so
//! the registry and the scene graph never disagree: a spawned entity always
//! has a live visual, and a removed entity's visual is released exactly once.

use cgmath::Vector3;
use log::{debug, info};
use rand::Rng;

use super::entity::{Entity, EntityId, ShapeKind};
use super::placement::sample_positions;
use crate::config::SpawnConfig;
use crate::gfx::backend::{SceneBackend, Transform};

/// Ordered collection of live entities, in spawn order
#[derive(Debug)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    next_id: u64,
    spawn: SpawnConfig,
}

impl EntityRegistry {
    pub fn new(spawn: SpawnConfig) -> Self {
        Self {
            entities: Vec::new(),
            next_id: 0,
            spawn,
        }
    }

    /// Replaces the current batch with `count` fresh entities
    pub fn spawn<R, B>(&mut self, count: usize, rng: &mut R, backend: &mut B) -> &[Entity]
    where
        R: Rng + ?Sized,
        B: SceneBackend + ?Sized,
    {
        let cleared = self.clear(backend);
        let positions = sample_positions(count, &self.spawn, rng);

        self.entities.reserve(count);
        for (index, position) in positions.into_iter().enumerate() {
            let kind = ShapeKind::round_robin(index);
            let id = self.allocate_id();
            let color = kind.random_color(rng);
            let visual = backend.add_visual(kind.visual_desc(id, position, color));

            self.entities.push(Entity {
                id,
                kind,
                position,
                visual,
                color,
            });
        }

        backend.mark_shadows_stale();
        info!("Spawned {} entities (replaced {})", self.entities.len(), cleared);
        &self.entities
    }

    /// Removes one entity and releases its visual; `None` if it is not live
    pub fn remove<B>(&mut self, id: EntityId, backend: &mut B) -> Option<Entity>
    where
        B: SceneBackend + ?Sized,
    {
        let index = self.entities.iter().position(|e| e.id == id)?;
        let entity = self.entities.remove(index);
        backend.remove_visual(entity.visual);
        backend.mark_shadows_stale();
        debug!("Removed {} {}", entity.kind.name(), entity.id);
        Some(entity)
    }

    /// Removes every entity; returns how many were removed
    pub fn clear<B>(&mut self, backend: &mut B) -> usize
    where
        B: SceneBackend + ?Sized,
    {
        let removed = self.entities.len();
        for entity in self.entities.drain(..) {
            backend.remove_visual(entity.visual);
        }
        if removed > 0 {
            backend.mark_shadows_stale();
        }
        removed
    }

    /// Moves an entity together with its visual; `false` if it is not live
    pub fn set_position<B>(&mut self, id: EntityId, position: Vector3<f32>, backend: &mut B) -> bool
    where
        B: SceneBackend + ?Sized,
    {
        match self.entities.iter_mut().find(|e| e.id == id) {
            Some(entity) => {
                entity.position = position;
                backend.set_transform(entity.visual, &Transform::from_translation(position));
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DioramaConfig;
    use crate::gfx::backend::testing::RecordingBackend;
    use cgmath::MetricSpace;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn registry() -> EntityRegistry {
        EntityRegistry::new(DioramaConfig::default().spawn)
    }

    #[test]
    fn spawn_creates_exactly_n_separated_entities() {
        let mut registry = registry();
        let mut backend = RecordingBackend::new();
        let mut rng = StdRng::seed_from_u64(7);

        let spawned = registry.spawn(80, &mut rng, &mut backend);
        assert_eq!(spawned.len(), 80);
        for (i, a) in spawned.iter().enumerate() {
            for b in &spawned[i + 1..] {
                assert!(a.position.distance(b.position) >= 1.5);
            }
        }
        assert_eq!(registry.len(), 80);
        assert_eq!(backend.live_count(), 80);
    }

    #[test]
    fn spawn_assigns_kinds_round_robin() {
        let mut registry = registry();
        let mut backend = RecordingBackend::new();
        let mut rng = StdRng::seed_from_u64(1);

        let kinds: Vec<_> = registry
            .spawn(6, &mut rng, &mut backend)
            .iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ShapeKind::Box,
                ShapeKind::Sphere,
                ShapeKind::Cylinder,
                ShapeKind::Box,
                ShapeKind::Sphere,
                ShapeKind::Cylinder,
            ]
        );
    }

    #[test]
    fn respawn_disposes_previous_batch_once() {
        let mut registry = registry();
        let mut backend = RecordingBackend::new();
        let mut rng = StdRng::seed_from_u64(11);

        let first: Vec<_> = registry
            .spawn(10, &mut rng, &mut backend)
            .iter()
            .map(|e| (e.id, e.visual))
            .collect();
        registry.spawn(10, &mut rng, &mut backend);

        assert_eq!(backend.live_count(), 10);
        for (id, visual) in first {
            assert_eq!(backend.disposal_count(visual), 1);
            assert!(!registry.contains(id));
        }
    }

    #[test]
    fn ids_are_never_reused() {
        let mut registry = registry();
        let mut backend = RecordingBackend::new();
        let mut rng = StdRng::seed_from_u64(5);

        let first: Vec<_> = registry.spawn(3, &mut rng, &mut backend).iter().map(|e| e.id).collect();
        let second: Vec<_> = registry.spawn(3, &mut rng, &mut backend).iter().map(|e| e.id).collect();
        assert!(first.iter().all(|id| !second.contains(id)));
    }

    #[test]
    fn remove_known_and_absent() {
        let mut registry = registry();
        let mut backend = RecordingBackend::new();
        let mut rng = StdRng::seed_from_u64(2);
        let target = registry.spawn(5, &mut rng, &mut backend)[2].clone();

        let removed = registry.remove(target.id, &mut backend).unwrap();
        assert_eq!(removed.id, target.id);
        assert_eq!(registry.len(), 4);
        assert_eq!(backend.disposal_count(target.visual), 1);

        assert!(registry.remove(target.id, &mut backend).is_none());
        assert_eq!(registry.len(), 4);
        assert_eq!(backend.disposal_count(target.visual), 1);
    }

    #[test]
    fn clear_reports_count_and_empties_backend() {
        let mut registry = registry();
        let mut backend = RecordingBackend::new();
        let mut rng = StdRng::seed_from_u64(4);
        registry.spawn(9, &mut rng, &mut backend);

        assert_eq!(registry.clear(&mut backend), 9);
        assert!(registry.is_empty());
        assert_eq!(backend.live_count(), 0);
        assert_eq!(registry.clear(&mut backend), 0);
    }

    #[test]
    fn set_position_moves_visual_too() {
        let mut registry = registry();
        let mut backend = RecordingBackend::new();
        let mut rng = StdRng::seed_from_u64(8);
        let entity = registry.spawn(2, &mut rng, &mut backend)[0].clone();

        let target = Vector3::new(1.0, 2.0, 3.0);
        assert!(registry.set_position(entity.id, target, &mut backend));
        assert_eq!(registry.get(entity.id).unwrap().position, target);
        assert_eq!(backend.transform_of(entity.visual).unwrap().translation, target);

        assert!(!registry.set_position(EntityId(999), target, &mut backend));
    }
}
