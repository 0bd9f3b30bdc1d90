use cgmath::{Quaternion, Rad, Rotation3, Vector3, Vector4};

use crate::gfx::backend::{MaterialDesc, SceneBackend, Transform, VisualDesc, VisualHandle};
use crate::gfx::geometry::{generate_box, generate_cylinder, generate_ground_plane, GeometryData};
use crate::gfx::picking::{Collider, Occluder};

pub const GROUND_UV_REPEAT: f32 = 10.0;
pub const CRATE_POSITION: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);
pub const CRATE_SIZE: f32 = 2.0;
pub const SPINNER_POSITION: Vector3<f32> = Vector3::new(0.0, 7.0, 0.0);
pub const SPINNER_RADIUS: f32 = 0.5;
pub const SPINNER_HEIGHT: f32 = 1.0;
pub const TREE_POSITION: Vector3<f32> = Vector3::new(0.0, 2.0, 0.0);
pub const TREE_SCALE: f32 = 0.5;

/// Decoration created once at startup; never pickable, never in the registry
#[derive(Debug, Clone, PartialEq)]
pub struct StaticProps {
    pub ground: VisualHandle,
    pub crate_box: VisualHandle,
    pub spinner: VisualHandle,
    /// Filled in once the model finishes loading
    pub tree: Vec<VisualHandle>,
    tree_bounds: Option<Occluder>,
}

impl StaticProps {
    pub fn create<B: SceneBackend + ?Sized>(ground_size: f32, backend: &mut B) -> Self {
        let ground = backend.add_visual(VisualDesc {
            label: "ground".into(),
            geometry: generate_ground_plane(ground_size, ground_size, GROUND_UV_REPEAT),
            material: MaterialDesc {
                roughness: 0.8,
                metalness: 0.1,
                ..Default::default()
            },
            transform: Transform::default(),
            cast_shadow: false,
            receive_shadow: true,
        });

        let crate_box = backend.add_visual(VisualDesc {
            label: "crate".into(),
            geometry: generate_box(CRATE_SIZE, CRATE_SIZE, CRATE_SIZE),
            material: MaterialDesc::default(),
            transform: Transform::from_translation(CRATE_POSITION),
            cast_shadow: false,
            receive_shadow: false,
        });

        let spinner = backend.add_visual(VisualDesc {
            label: "spinner".into(),
            geometry: generate_cylinder(SPINNER_RADIUS, SPINNER_HEIGHT, 16),
            material: MaterialDesc::from_color([0.0, 0.5, 0.5, 1.0]),
            transform: Transform::from_translation(SPINNER_POSITION),
            cast_shadow: false,
            receive_shadow: false,
        });

        Self {
            ground,
            crate_box,
            spinner,
            tree: Vec::new(),
            tree_bounds: None,
        }
    }

    /// Volumes that block picking: crate, spinner and tree, never the ground
    ///
    /// The spinner turns, so it is covered by its bounding sphere.
    pub fn occluders(&self) -> Vec<Occluder> {
        let half = CRATE_SIZE * 0.5;
        let mut occluders = vec![
            Occluder::new(
                CRATE_POSITION,
                Collider::Box {
                    half_extents: Vector3::new(half, half, half),
                },
            ),
            Occluder::new(
                SPINNER_POSITION,
                Collider::Sphere {
                    radius: SPINNER_RADIUS.hypot(SPINNER_HEIGHT * 0.5),
                },
            ),
        ];
        occluders.extend(self.tree_bounds);
        occluders
    }

    /// Rotates the spinner about X to `elapsed_secs` radians
    pub fn spin<B: SceneBackend + ?Sized>(&self, elapsed_secs: f32, backend: &mut B) {
        let transform = Transform::from_translation(SPINNER_POSITION)
            .with_rotation(Quaternion::from_angle_x(Rad(elapsed_secs)));
        backend.set_transform(self.spinner, &transform);
    }

    /// Adds the loaded tree meshes at the tree's spot
    pub fn attach_tree<B, I>(&mut self, meshes: I, backend: &mut B)
    where
        B: SceneBackend + ?Sized,
        I: IntoIterator<Item = (String, GeometryData, MaterialDesc)>,
    {
        let transform = Transform::from_translation(TREE_POSITION).with_uniform_scale(TREE_SCALE);
        let model = transform.to_matrix();
        let mut corners = Vec::new();
        for (label, geometry, material) in meshes {
            corners.extend(
                geometry
                    .vertices
                    .iter()
                    .map(|&[x, y, z]| (model * Vector4::new(x, y, z, 1.0)).truncate()),
            );
            let handle = backend.add_visual(VisualDesc {
                label,
                geometry,
                material,
                transform,
                cast_shadow: true,
                receive_shadow: true,
            });
            self.tree.push(handle);
        }
        if let Some(Occluder {
            center,
            collider: Collider::Box { half_extents },
        }) = self.tree_bounds
        {
            corners.push(center - half_extents);
            corners.push(center + half_extents);
        }
        self.tree_bounds = Occluder::bounding(corners).or(self.tree_bounds);
        backend.mark_shadows_stale();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::testing::RecordingBackend;
    use approx::assert_relative_eq;
    use cgmath::Vector4;

    #[test]
    fn props_are_created_in_place() {
        let mut backend = RecordingBackend::new();
        let props = StaticProps::create(30.0, &mut backend);
        assert_eq!(backend.live_count(), 3);
        assert_eq!(
            backend.transform_of(props.crate_box).unwrap().translation,
            CRATE_POSITION
        );
        let ground = &backend.live[&props.ground];
        assert_eq!(ground.material.roughness, 0.8);
    }

    #[test]
    fn spinner_rotates_about_x() {
        let mut backend = RecordingBackend::new();
        let props = StaticProps::create(30.0, &mut backend);
        props.spin(std::f32::consts::FRAC_PI_2, &mut backend);

        let transform = backend.transform_of(props.spinner).unwrap();
        let tip = transform.to_matrix() * Vector4::new(0.0, 1.0, 0.0, 1.0);
        assert_relative_eq!(tip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(tip.y, 7.0, epsilon = 1e-5);
        assert_relative_eq!(tip.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn tree_meshes_share_transform() {
        let mut backend = RecordingBackend::new();
        let mut props = StaticProps::create(30.0, &mut backend);
        let meshes = vec![
            ("trunk".to_string(), GeometryData::new(), MaterialDesc::default()),
            ("leaves".to_string(), GeometryData::new(), MaterialDesc::default()),
        ];
        props.attach_tree(meshes, &mut backend);

        assert_eq!(props.tree.len(), 2);
        for handle in &props.tree {
            let transform = backend.transform_of(*handle).unwrap();
            assert_eq!(transform.translation, TREE_POSITION);
            assert_eq!(transform.scale, Vector3::new(0.5, 0.5, 0.5));
        }
        assert_eq!(backend.shadow_invalidations, 1);
    }

    #[test]
    fn occluders_cover_crate_spinner_and_loaded_tree() {
        let mut backend = RecordingBackend::new();
        let mut props = StaticProps::create(30.0, &mut backend);
        assert_eq!(props.occluders().len(), 2);
        assert_eq!(props.occluders()[0].center, CRATE_POSITION);

        let mut trunk = GeometryData::new();
        trunk.vertices = vec![[-1.0, 0.0, -1.0], [1.0, 4.0, 1.0]];
        props.attach_tree(vec![("trunk".to_string(), trunk, MaterialDesc::default())], &mut backend);

        let occluders = props.occluders();
        assert_eq!(occluders.len(), 3);
        let tree = occluders[2];
        assert_relative_eq!(tree.center.y, TREE_POSITION.y + 1.0, epsilon = 1e-5);
        assert_eq!(
            tree.collider,
            Collider::Box {
                half_extents: Vector3::new(0.5, 1.0, 0.5)
            }
        );
    }
}
