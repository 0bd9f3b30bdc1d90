//! OBJ + MTL model import
//!
//! The material library is given explicitly instead of being resolved from
//! the `mtllib` line, so a model and its materials can live apart.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, warn};

use crate::error::{DioramaError, Result};
use crate::gfx::backend::MaterialDesc;
use crate::gfx::geometry::GeometryData;

/// One mesh of an imported model with its resolved material
#[derive(Debug, Clone)]
pub struct ModelMesh {
    pub name: String,
    pub geometry: GeometryData,
    pub material: MaterialDesc,
}

/// Maps MTL shininess (0..128) onto roughness (1..0)
pub fn shininess_to_roughness(shininess: Option<f32>) -> f32 {
    1.0 - (shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0)
}

fn material_from_mtl(mtl: &tobj::Material) -> MaterialDesc {
    let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    MaterialDesc {
        base_color: [diffuse[0], diffuse[1], diffuse[2], mtl.dissolve.unwrap_or(1.0)],
        roughness: shininess_to_roughness(mtl.shininess),
        metalness: 0.0,
        texture: None,
    }
}

/// Loads every mesh of `obj_path`, taking materials from `mtl_path`
///
/// A missing or broken material library is not fatal: meshes fall back to
/// the default material.
pub fn load_obj_with_mtl(obj_path: &Path, mtl_path: &Path) -> Result<Vec<ModelMesh>> {
    let file = File::open(obj_path).map_err(|source| DioramaError::AssetIo {
        path: obj_path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let (models, materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| tobj::load_mtl(mtl_path),
    )
    .map_err(|source| DioramaError::Model {
        path: obj_path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|e| {
        warn!("Material library '{}' unusable ({}), using defaults", mtl_path.display(), e);
        Vec::new()
    });

    if models.is_empty() {
        return Err(DioramaError::EmptyModel {
            path: obj_path.to_path_buf(),
        });
    }

    let meshes: Vec<ModelMesh> = models
        .into_iter()
        .enumerate()
        .map(|(i, model)| {
            let mesh = model.mesh;
            let material = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(material_from_mtl)
                .unwrap_or_default();
            let name = if model.name.is_empty() {
                format!("mesh_{}", i)
            } else {
                model.name
            };
            ModelMesh {
                geometry: GeometryData::from_flat(&mesh.positions, &mesh.normals, &mesh.texcoords, &mesh.indices),
                name,
                material,
            }
        })
        .collect();

    debug!(
        "Loaded '{}': {} meshes, {} materials",
        obj_path.display(),
        meshes.len(),
        materials.len()
    );
    Ok(meshes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::path::PathBuf;

    const TRIANGLE_OBJ: &str = "\
mtllib model.mtl
o leaf
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
usemtl green
f 1 2 3
o trunk
v 0.0 0.0 1.0
v 1.0 0.0 1.0
v 1.0 1.0 1.0
v 0.0 1.0 1.0
usemtl bark
f 4 5 6 7
";

    const MATERIALS: &str = "\
newmtl green
Kd 0.1 0.8 0.2
d 0.5
Ns 96.0

newmtl bark
Kd 0.4 0.3 0.2
";

    fn write_model(name: &str, obj: &str, mtl: Option<&str>) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("diorama-model-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let obj_path = dir.join("model.obj");
        let mtl_path = dir.join("model.mtl");
        std::fs::write(&obj_path, obj).unwrap();
        if let Some(mtl) = mtl {
            std::fs::write(&mtl_path, mtl).unwrap();
        }
        (obj_path, mtl_path)
    }

    #[test]
    fn meshes_pick_up_their_materials() {
        let (obj, mtl) = write_model("materials", TRIANGLE_OBJ, Some(MATERIALS));
        let meshes = load_obj_with_mtl(&obj, &mtl).unwrap();

        assert_eq!(meshes.len(), 2);
        let leaf = &meshes[0];
        assert_eq!(leaf.name, "leaf");
        assert_eq!(leaf.geometry.triangle_count(), 1);
        assert_relative_eq!(leaf.material.base_color[1], 0.8);
        assert_relative_eq!(leaf.material.base_color[3], 0.5);
        assert_relative_eq!(leaf.material.roughness, 0.25);

        // quad is triangulated
        let trunk = &meshes[1];
        assert_eq!(trunk.geometry.triangle_count(), 2);
        assert_relative_eq!(trunk.material.base_color[3], 1.0);
    }

    #[test]
    fn missing_material_library_falls_back_to_defaults() {
        let (obj, mtl) = write_model("no-mtl", TRIANGLE_OBJ, None);
        let meshes = load_obj_with_mtl(&obj, &mtl).unwrap();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].material, MaterialDesc::default());
    }

    #[test]
    fn missing_obj_is_an_error() {
        let err = load_obj_with_mtl(Path::new("/nope/tree.obj"), Path::new("/nope/tree.mtl")).unwrap_err();
        assert!(matches!(err, DioramaError::AssetIo { .. }));
    }

    #[test]
    fn roughness_mapping() {
        assert_relative_eq!(shininess_to_roughness(None), 0.75);
        assert_relative_eq!(shininess_to_roughness(Some(0.0)), 1.0);
        assert_relative_eq!(shininess_to_roughness(Some(500.0)), 0.0);
    }
}
