//! # Object Picking System
//!
//! Mouse ray-casting against the simple colliders of scene entities and
//! against the ground plane.
//!
//! ## How it works
//!
//! 1. **Pointer to Ray**: Convert the normalized pointer position to a world-space ray
//! 2. **Ray-Collider Intersection**: Test the ray against each candidate's collider
//! 3. **Selection**: Return the closest hit
//!
//! ## Usage
//!
//! ```rust
//! use cgmath::{Vector2, Vector3};
//! use diorama::config::DioramaConfig;
//! use diorama::gfx::camera::FlyCamera;
//! use diorama::gfx::picking::{pick_nearest, ray_from_ndc, Collider};
//!
//! let camera = FlyCamera::new(&DioramaConfig::default().camera, 1.0);
//! let ray = ray_from_ndc(Vector2::new(0.0, 0.0), &camera);
//! let candidates = [(7u32, Vector3::new(0.0, 0.0, 0.0), Collider::Sphere { radius: 0.5 })];
//! let hit = pick_nearest(&ray, candidates);
//! assert_eq!(hit.map(|h| h.key), Some(7));
//! ```

use cgmath::{ElementWise, InnerSpace, Matrix4, SquareMatrix, Vector2, Vector3, Vector4};

use crate::gfx::camera::FlyCamera;

const PARALLEL_EPSILON: f32 = 1e-6;

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vector3<f32>,
    /// Normalized direction
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vector3<f32>, half: Vector3<f32>) -> Self {
        Self::new(center - half, center + half)
    }

    /// Slab test; returns the distance to the first hit in front of the origin
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t_near = t_min.x.min(t_max.x).max(t_min.y.min(t_max.y)).max(t_min.z.min(t_max.z));
        let t_far = t_min.x.max(t_max.x).min(t_min.y.max(t_max.y)).min(t_min.z.max(t_max.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }
}

/// Pickable volume of an entity, centered on its position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    Box { half_extents: Vector3<f32> },
    Sphere { radius: f32 },
    /// Y-aligned
    Cylinder { radius: f32, half_height: f32 },
}

impl Collider {
    /// Distance along the ray to the first surface hit
    pub fn intersect(&self, center: Vector3<f32>, ray: &Ray) -> Option<f32> {
        match *self {
            Collider::Box { half_extents } => {
                Aabb::from_center_half_extents(center, half_extents).intersect_ray(ray)
            }
            Collider::Sphere { radius } => intersect_sphere(center, radius, ray),
            Collider::Cylinder {
                radius,
                half_height,
            } => intersect_cylinder(center, radius, half_height, ray),
        }
    }
}

fn intersect_sphere(center: Vector3<f32>, radius: f32, ray: &Ray) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.magnitude2() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    [-b - sqrt_d, -b + sqrt_d].into_iter().find(|t| *t >= 0.0)
}

fn intersect_cylinder(center: Vector3<f32>, radius: f32, half_height: f32, ray: &Ray) -> Option<f32> {
    let o = ray.origin - center;
    let d = ray.direction;
    let mut nearest: Option<f32> = None;
    let mut consider = |t: f32| {
        if t >= 0.0 && nearest.map_or(true, |n| t < n) {
            nearest = Some(t);
        }
    };

    // Side wall
    let a = d.x * d.x + d.z * d.z;
    if a > PARALLEL_EPSILON {
        let b = o.x * d.x + o.z * d.z;
        let c = o.x * o.x + o.z * o.z - radius * radius;
        let discriminant = b * b - a * c;
        if discriminant >= 0.0 {
            let sqrt_d = discriminant.sqrt();
            for t in [(-b - sqrt_d) / a, (-b + sqrt_d) / a] {
                let y = o.y + d.y * t;
                if y.abs() <= half_height {
                    consider(t);
                }
            }
        }
    }

    // Caps
    if d.y.abs() > PARALLEL_EPSILON {
        for cap_y in [-half_height, half_height] {
            let t = (cap_y - o.y) / d.y;
            let x = o.x + d.x * t;
            let z = o.z + d.z * t;
            if x * x + z * z <= radius * radius {
                consider(t);
            }
        }
    }

    nearest
}

/// Finite horizontal ground square
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPlane {
    pub height: f32,
    pub half_extent: f32,
}

impl GroundPlane {
    pub fn new(height: f32, size: f32) -> Self {
        Self {
            height,
            half_extent: size * 0.5,
        }
    }

    /// World-space hit point, or `None` when the ray misses the square
    pub fn intersect(&self, ray: &Ray) -> Option<Vector3<f32>> {
        if ray.direction.y.abs() <= PARALLEL_EPSILON {
            return None;
        }

        let t = (self.height - ray.origin.y) / ray.direction.y;
        if t <= 0.0 {
            return None;
        }

        let point = ray.point_at(t);
        (point.x.abs() <= self.half_extent && point.z.abs() <= self.half_extent).then_some(point)
    }
}

/// Result of a picking query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult<K> {
    pub key: K,
    pub distance: f32,
    pub point: Vector3<f32>,
}

/// Converts a window pixel position to normalized device coordinates
///
/// Returns `None` for a degenerate viewport.
pub fn pointer_to_ndc(position: (f32, f32), viewport: (f32, f32)) -> Option<Vector2<f32>> {
    let (width, height) = viewport;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Vector2::new(
        (position.0 / width) * 2.0 - 1.0,
        -(position.1 / height) * 2.0 + 1.0,
    ))
}

/// Builds the world-space ray through a normalized pointer position
pub fn ray_from_ndc(ndc: Vector2<f32>, camera: &FlyCamera) -> Ray {
    let view_proj = camera.projection_matrix() * camera.view_matrix();
    let inv_view_proj = view_proj.invert().unwrap_or_else(Matrix4::identity);

    let unproject = |z: f32| {
        let world = inv_view_proj * Vector4::new(ndc.x, ndc.y, z, 1.0);
        world.truncate() / world.w
    };

    let near = unproject(-1.0);
    let far = unproject(1.0);
    Ray::new(near, far - near)
}

/// Geometry that stops rays without being pickable itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occluder {
    pub center: Vector3<f32>,
    pub collider: Collider,
}

impl Occluder {
    pub fn new(center: Vector3<f32>, collider: Collider) -> Self {
        Self { center, collider }
    }

    /// Axis-aligned box around `points`; `None` when there are none
    pub fn bounding<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vector3<f32>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        });
        Some(Self::new(
            (min + max) * 0.5,
            Collider::Box {
                half_extents: (max - min) * 0.5,
            },
        ))
    }

    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        self.collider.intersect(self.center, ray)
    }
}

/// Drops `hit` when any occluder lies between the ray origin and it
pub fn unoccluded<K>(ray: &Ray, hit: PickResult<K>, occluders: &[Occluder]) -> Option<PickResult<K>> {
    let blocked = occluders
        .iter()
        .any(|o| o.intersect(ray).is_some_and(|d| d < hit.distance));
    (!blocked).then_some(hit)
}

/// Returns the closest candidate hit by the ray
pub fn pick_nearest<K, I>(ray: &Ray, candidates: I) -> Option<PickResult<K>>
where
    I: IntoIterator<Item = (K, Vector3<f32>, Collider)>,
{
    let mut closest: Option<PickResult<K>> = None;

    for (key, center, collider) in candidates {
        if let Some(distance) = collider.intersect(center, ray) {
            if closest.as_ref().map_or(true, |c| distance < c.distance) {
                closest = Some(PickResult {
                    key,
                    distance,
                    point: ray.point_at(distance),
                });
            }
        }
    }

    closest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DioramaConfig;
    use approx::assert_relative_eq;

    fn down_ray(x: f32, z: f32) -> Ray {
        Ray::new(Vector3::new(x, 10.0, z), Vector3::new(0.0, -1.0, 0.0))
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(aabb.intersect_ray(&ray).unwrap(), 4.0);

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());

        let ray_behind = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_behind).is_none());
    }

    #[test]
    fn sphere_hit_distance() {
        let collider = Collider::Sphere { radius: 0.5 };
        let t = collider.intersect(Vector3::new(0.0, 2.0, 0.0), &down_ray(0.0, 0.0));
        assert_relative_eq!(t.unwrap(), 7.5, epsilon = 1e-5);
        assert!(collider
            .intersect(Vector3::new(0.0, 2.0, 0.0), &down_ray(0.6, 0.0))
            .is_none());
    }

    #[test]
    fn cylinder_hits_cap_from_above_and_wall_from_side() {
        let collider = Collider::Cylinder {
            radius: 0.5,
            half_height: 0.5,
        };
        let center = Vector3::new(0.0, 2.0, 0.0);

        let t = collider.intersect(center, &down_ray(0.2, 0.1)).unwrap();
        assert_relative_eq!(t, 7.5, epsilon = 1e-5);

        let side = Ray::new(Vector3::new(-5.0, 2.2, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(collider.intersect(center, &side).unwrap(), 4.5, epsilon = 1e-5);

        let above = Ray::new(Vector3::new(-5.0, 2.6, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert!(collider.intersect(center, &above).is_none());
    }

    #[test]
    fn ground_plane_is_finite() {
        let ground = GroundPlane::new(0.0, 30.0);
        let hit = ground.intersect(&down_ray(3.0, -4.0)).unwrap();
        assert_relative_eq!(hit.x, 3.0);
        assert_relative_eq!(hit.y, 0.0);
        assert_relative_eq!(hit.z, -4.0);

        assert!(ground.intersect(&down_ray(16.0, 0.0)).is_none());
        let upward = Ray::new(Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
        assert!(ground.intersect(&upward).is_none());
    }

    #[test]
    fn pointer_maps_to_ndc_with_flipped_y() {
        let ndc = pointer_to_ndc((0.0, 0.0), (800.0, 600.0)).unwrap();
        assert_eq!(ndc, Vector2::new(-1.0, 1.0));
        let ndc = pointer_to_ndc((400.0, 300.0), (800.0, 600.0)).unwrap();
        assert_eq!(ndc, Vector2::new(0.0, 0.0));
        assert!(pointer_to_ndc((1.0, 1.0), (0.0, 600.0)).is_none());
    }

    #[test]
    fn center_ray_follows_look_direction() {
        let camera = FlyCamera::new(&DioramaConfig::default().camera, 1.5);
        let ray = ray_from_ndc(Vector2::new(0.0, 0.0), &camera);
        let look = camera.look_direction();
        assert_relative_eq!(ray.direction.dot(look), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn pick_returns_nearest() {
        let ray = down_ray(0.0, 0.0);
        let sphere = Collider::Sphere { radius: 0.5 };
        let hit = pick_nearest(
            &ray,
            [
                ("low", Vector3::new(0.0, 1.0, 0.0), sphere),
                ("high", Vector3::new(0.0, 4.0, 0.0), sphere),
                ("aside", Vector3::new(5.0, 8.0, 0.0), sphere),
            ],
        )
        .unwrap();
        assert_eq!(hit.key, "high");
        assert_relative_eq!(hit.point.y, 4.5, epsilon = 1e-5);
    }

    #[test]
    fn occluder_in_front_blocks_hit() {
        let ray = down_ray(0.0, 0.0);
        let hit = pick_nearest(&ray, [(1u8, Vector3::new(0.0, 0.5, 0.0), Collider::Sphere { radius: 0.5 })])
            .unwrap();

        let roof = Occluder::new(
            Vector3::new(0.0, 3.0, 0.0),
            Collider::Box {
                half_extents: Vector3::new(1.0, 0.1, 1.0),
            },
        );
        assert!(unoccluded(&ray, hit, &[roof]).is_none());

        let beside = Occluder::new(roof.center + Vector3::new(5.0, 0.0, 0.0), roof.collider);
        let below = Occluder::new(Vector3::new(0.0, -3.0, 0.0), roof.collider);
        assert_eq!(unoccluded(&ray, hit, &[beside, below]).map(|h| h.key), Some(1));
    }

    #[test]
    fn bounding_box_encloses_points() {
        let occluder = Occluder::bounding([
            Vector3::new(-1.0, 0.0, 2.0),
            Vector3::new(3.0, 4.0, -2.0),
            Vector3::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        assert_eq!(occluder.center, Vector3::new(1.0, 2.0, 0.0));
        assert_eq!(
            occluder.collider,
            Collider::Box {
                half_extents: Vector3::new(2.0, 2.0, 2.0)
            }
        );
        assert!(Occluder::bounding(Vec::new()).is_none());
    }
}
