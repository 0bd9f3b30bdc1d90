//! # Procedural Geometry Generation
//!
//! Generates the primitive shapes the diorama is built from: boxes, spheres,
//! cylinders and the ground plane. Everything is Y-up and centered on the
//! origin, so a visual's transform alone decides where it sits in the world.
//!
//! ## Usage
//!
//! ```rust
//! use diorama::gfx::geometry::{generate_box, generate_sphere, generate_ground_plane};
//!
//! let crate_box = generate_box(2.0, 2.0, 2.0);
//! let ball = generate_sphere(0.5, 16, 16);
//! let ground = generate_ground_plane(30.0, 30.0, 10.0);
//! assert_eq!(crate_box.triangle_count(), 12);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::rendering::vertex::Vertex3D;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaves the attribute streams into the renderer's vertex format
    ///
    /// Missing normals default to +Y and missing texture coordinates to zero.
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex3D {
                position: *position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }

    /// Builds geometry from flat position/normal/uv arrays as produced by OBJ loaders
    ///
    /// Normals are recomputed from faces when absent or mismatched.
    pub fn from_flat(positions: &[f32], normals: &[f32], tex_coords: &[f32], indices: &[u32]) -> Self {
        let vertex_count = positions.len() / 3;
        let normals = if normals.len() == positions.len() {
            normals.to_vec()
        } else {
            calculate_vertex_normals(positions, indices)
        };

        let mut data = Self::new();
        for i in 0..vertex_count {
            data.vertices
                .push([positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]]);
            data.normals
                .push([normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]]);
            if tex_coords.len() == vertex_count * 2 {
                // OBJ texture space has v pointing up
                data.tex_coords
                    .push([tex_coords[i * 2], 1.0 - tex_coords[i * 2 + 1]]);
            }
        }
        data.indices = indices.to_vec();
        data
    }
}

/// Averages face normals into per-vertex normals
pub fn calculate_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let mut normals = vec![0.0; positions.len()];

    let vertex = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
            continue;
        }

        let (v0, v1, v2) = (vertex(i0), vertex(i1), vertex(i2));
        let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        let face_normal = [
            edge1[1] * edge2[2] - edge1[2] * edge2[1],
            edge1[2] * edge2[0] - edge1[0] * edge2[2],
            edge1[0] * edge2[1] - edge1[1] * edge2[0],
        ];

        for &index in &[i0, i1, i2] {
            normals[index * 3] += face_normal[0];
            normals[index * 3 + 1] += face_normal[1];
            normals[index * 3 + 2] += face_normal[2];
        }
    }

    for normal in normals.chunks_exact_mut(3) {
        let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
        if length > 0.0 {
            normal.iter_mut().for_each(|c| *c /= length);
        } else {
            normal.copy_from_slice(&[0.0, 1.0, 0.0]);
        }
    }

    normals
}
