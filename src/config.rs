//! Runtime configuration
//!
//! Defaults describe the stock demo scene. A handful of values can be
//! overridden from the environment:
//!
//! | Variable | Effect |
//! |---|---|
//! | `DIORAMA_ASSET_DIR` | Root directory for textures and models |
//! | `DIORAMA_SHAPE_COUNT` | Number of shapes per regenerate |
//! | `DIORAMA_SEED` | Fixed RNG seed for reproducible layouts |
//! | `DIORAMA_SHADOW_DEBUG` | Log every shadow map regeneration |

use cgmath::Vector3;
use std::path::{Path, PathBuf};

use crate::error::{DioramaError, Result};

/// Top-level configuration for the diorama
#[derive(Debug, Clone)]
pub struct DioramaConfig {
    pub window: WindowConfig,
    pub spawn: SpawnConfig,
    pub camera: CameraConfig,
    pub drag: DragConfig,
    pub assets: AssetConfig,
    /// Fixed RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
    pub shadow_debug: bool,
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

/// Spawn parameters for the regenerate operation
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub count: usize,
    /// Smallest center-to-center distance inside one batch
    pub min_separation: f32,
    /// Half side of the horizontal sampling square
    pub half_extent: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub max_attempts_per_entity: u32,
    pub widen_factor: f32,
    pub max_widenings: u32,
}

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    pub fov_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// World units per frame for primary movement keys
    pub move_speed: f32,
    /// Fraction of `move_speed` used by the strafe keys
    pub strafe_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub damping_factor: f32,
}

#[derive(Debug, Clone)]
pub struct DragConfig {
    /// Interpolation factor toward the drag target, in (0, 1)
    pub smoothing: f32,
    /// Side length of the square ground plane
    pub ground_size: f32,
}

/// Asset locations, relative to `root`
#[derive(Debug, Clone)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub ground_texture: PathBuf,
    pub crate_texture: PathBuf,
    pub environment: PathBuf,
    pub tree_obj: PathBuf,
    pub tree_mtl: PathBuf,
}

impl AssetConfig {
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

impl Default for DioramaConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig {
                title: "Diorama".to_string(),
                width: 1200,
                height: 800,
            },
            spawn: SpawnConfig {
                count: 80,
                min_separation: 1.5,
                half_extent: 15.0,
                min_height: 1.0,
                max_height: 5.0,
                max_attempts_per_entity: 1000,
                widen_factor: 1.1,
                max_widenings: 32,
            },
            camera: CameraConfig {
                position: Vector3::new(0.0, 5.0, 10.0),
                target: Vector3::new(0.0, 0.0, 0.0),
                fov_degrees: 75.0,
                znear: 0.1,
                zfar: 100.0,
                move_speed: 0.1,
                strafe_factor: 0.2,
                rotate_speed: 0.005,
                zoom_speed: 0.05,
                damping_factor: 0.05,
            },
            drag: DragConfig {
                smoothing: 0.3,
                ground_size: 30.0,
            },
            assets: AssetConfig {
                root: PathBuf::from("assets"),
                ground_texture: PathBuf::from("textures/ground.jpg"),
                crate_texture: PathBuf::from("textures/wood.jpg"),
                environment: PathBuf::from("textures/sky.hdr"),
                tree_obj: PathBuf::from("models/tree.obj"),
                tree_mtl: PathBuf::from("models/tree.mtl"),
            },
            seed: None,
            shadow_debug: false,
        }
    }
}

impl DioramaConfig {
    /// Defaults with overrides read from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("DIORAMA_ASSET_DIR") {
            config.assets.root = PathBuf::from(dir);
        }

        if let Some(raw) = lookup("DIORAMA_SHAPE_COUNT") {
            config.spawn.count = raw.trim().parse().map_err(|_| DioramaError::Config {
                key: "DIORAMA_SHAPE_COUNT",
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup("DIORAMA_SEED") {
            let seed = raw.trim().parse().map_err(|_| DioramaError::Config {
                key: "DIORAMA_SEED",
                value: raw.clone(),
            })?;
            config.seed = Some(seed);
        }

        config.shadow_debug = lookup("DIORAMA_SHADOW_DEBUG").is_some();

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_describe_demo_scene() {
        let config = DioramaConfig::default();
        assert_eq!(config.spawn.count, 80);
        assert_eq!(config.spawn.min_separation, 1.5);
        assert_eq!(config.drag.smoothing, 0.3);
        assert_eq!(config.camera.move_speed, 0.1);
        assert_eq!(config.camera.position, Vector3::new(0.0, 5.0, 10.0));
        assert!(config.seed.is_none());
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = DioramaConfig::from_lookup(lookup_from(&[
            ("DIORAMA_ASSET_DIR", "/srv/diorama"),
            ("DIORAMA_SHAPE_COUNT", " 12 "),
            ("DIORAMA_SEED", "42"),
            ("DIORAMA_SHADOW_DEBUG", "1"),
        ]))
        .unwrap();

        assert_eq!(config.assets.root, PathBuf::from("/srv/diorama"));
        assert_eq!(config.spawn.count, 12);
        assert_eq!(config.seed, Some(42));
        assert!(config.shadow_debug);
    }

    #[test]
    fn invalid_count_is_rejected() {
        let err = DioramaConfig::from_lookup(lookup_from(&[("DIORAMA_SHAPE_COUNT", "many")]))
            .unwrap_err();
        assert!(matches!(
            err,
            DioramaError::Config {
                key: "DIORAMA_SHAPE_COUNT",
                ..
            }
        ));
    }

    #[test]
    fn asset_paths_resolve_against_root() {
        let config = DioramaConfig::default();
        let path = config.assets.resolve(&config.assets.tree_obj);
        assert_eq!(path, PathBuf::from("assets/models/tree.obj"));
    }
}
