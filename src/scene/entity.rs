use cgmath::Vector3;
use rand::Rng;

use crate::gfx::backend::{MaterialDesc, Transform, VisualDesc, VisualHandle};
use crate::gfx::geometry::{generate_box, generate_cylinder, generate_sphere, GeometryData};
use crate::gfx::picking::Collider;

const SHAPE_SEGMENTS: u32 = 16;

/// Identifier of a registry entity, never reused within one registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shapes a spawn batch cycles through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Box,
    Sphere,
    Cylinder,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Box, ShapeKind::Sphere, ShapeKind::Cylinder];

    /// Kind of the `index`-th entity of a batch
    pub fn round_robin(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Box => "box",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cylinder => "cylinder",
        }
    }

    /// Unit-sized mesh: 1x1x1 box, radius 0.5 sphere, radius 0.5 height 1 cylinder
    pub fn geometry(&self) -> GeometryData {
        match self {
            ShapeKind::Box => generate_box(1.0, 1.0, 1.0),
            ShapeKind::Sphere => generate_sphere(0.5, SHAPE_SEGMENTS, SHAPE_SEGMENTS),
            ShapeKind::Cylinder => generate_cylinder(0.5, 1.0, SHAPE_SEGMENTS),
        }
    }

    pub fn collider(&self) -> Collider {
        match self {
            ShapeKind::Box => Collider::Box {
                half_extents: Vector3::new(0.5, 0.5, 0.5),
            },
            ShapeKind::Sphere => Collider::Sphere { radius: 0.5 },
            ShapeKind::Cylinder => Collider::Cylinder {
                radius: 0.5,
                half_height: 0.5,
            },
        }
    }

    /// Random color biased per kind: boxes lean magenta, spheres green, cylinders blue
    pub fn random_color<R: Rng + ?Sized>(&self, rng: &mut R) -> [f32; 4] {
        let (r, g, b): (f32, f32, f32) = (rng.random(), rng.random(), rng.random());
        match self {
            ShapeKind::Box => [r, g * 0.5, b, 1.0],
            ShapeKind::Sphere => [r * 0.5, g, b * 0.5, 1.0],
            ShapeKind::Cylinder => [r * 0.5, g * 0.5, b, 1.0],
        }
    }

    pub(crate) fn visual_desc(&self, id: EntityId, position: Vector3<f32>, color: [f32; 4]) -> VisualDesc {
        VisualDesc {
            label: format!("{} {}", self.name(), id),
            geometry: self.geometry(),
            material: MaterialDesc::from_color(color),
            transform: Transform::from_translation(position),
            cast_shadow: true,
            receive_shadow: true,
        }
    }
}

/// A spawned, pickable scene object
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: ShapeKind,
    pub position: Vector3<f32>,
    pub visual: VisualHandle,
    pub color: [f32; 4],
}

impl Entity {
    pub fn collider(&self) -> Collider {
        self.kind.collider()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn kinds_cycle_box_sphere_cylinder() {
        let kinds: Vec<_> = (0..7).map(ShapeKind::round_robin).collect();
        assert_eq!(
            kinds,
            vec![
                ShapeKind::Box,
                ShapeKind::Sphere,
                ShapeKind::Cylinder,
                ShapeKind::Box,
                ShapeKind::Sphere,
                ShapeKind::Cylinder,
                ShapeKind::Box,
            ]
        );
    }

    #[test]
    fn colors_respect_per_kind_bias() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let [_, g, _, a] = ShapeKind::Box.random_color(&mut rng);
            assert!(g < 0.5);
            assert_eq!(a, 1.0);

            let [r, _, b, _] = ShapeKind::Sphere.random_color(&mut rng);
            assert!(r < 0.5 && b < 0.5);

            let [r, g, b, _] = ShapeKind::Cylinder.random_color(&mut rng);
            assert!(r < 0.5 && g < 0.5 && b < 1.0);
        }
    }

    #[test]
    fn unit_shapes_have_geometry() {
        for kind in ShapeKind::ALL {
            let geometry = kind.geometry();
            assert!(geometry.triangle_count() > 0, "{} is empty", kind.name());
        }
    }
}
