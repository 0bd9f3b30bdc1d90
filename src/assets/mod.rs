//! # Background Asset Loading
//!
//! Textures, the sky panorama and the tree model are decoded on short-lived
//! worker threads. Each request returns immediately; the decoded result
//! travels back through a one-shot channel and is handed out by
//! [`AssetLoader::poll`] on the frame thread, once. Failed loads are logged
//! and dropped.

pub mod decode;
pub mod model;

use std::path::PathBuf;
use std::thread;

use futures::channel::oneshot;
use log::{debug, info, warn};

use crate::config::AssetConfig;
use crate::error::Result;

pub use decode::DecodedImage;
pub use model::ModelMesh;

/// Where a loaded asset goes in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetSlot {
    GroundTexture,
    CrateTexture,
    Environment,
    Tree,
}

#[derive(Debug, Clone)]
pub enum AssetPayload {
    Image(DecodedImage),
    Model(Vec<ModelMesh>),
}

/// A finished load, ready to be applied
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub slot: AssetSlot,
    pub path: PathBuf,
    pub payload: AssetPayload,
}

struct PendingLoad {
    slot: AssetSlot,
    path: PathBuf,
    receiver: oneshot::Receiver<Result<AssetPayload>>,
}

#[derive(Default)]
pub struct AssetLoader {
    pending: Vec<PendingLoad>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests every asset the diorama uses
    pub fn request_scene_assets(&mut self, assets: &AssetConfig) {
        self.request_texture(AssetSlot::GroundTexture, assets.resolve(&assets.ground_texture));
        self.request_texture(AssetSlot::CrateTexture, assets.resolve(&assets.crate_texture));
        self.request_environment(AssetSlot::Environment, assets.resolve(&assets.environment));
        self.request_model(
            AssetSlot::Tree,
            assets.resolve(&assets.tree_obj),
            assets.resolve(&assets.tree_mtl),
        );
    }

    /// JPEG or PNG texture decoded to RGBA8
    pub fn request_texture(&mut self, slot: AssetSlot, path: PathBuf) {
        let job_path = path.clone();
        self.spawn(slot, path, move || decode::load_rgba(&job_path).map(AssetPayload::Image));
    }

    /// HDR panorama tone-mapped to RGBA8
    pub fn request_environment(&mut self, slot: AssetSlot, path: PathBuf) {
        let job_path = path.clone();
        self.spawn(slot, path, move || {
            decode::load_hdr_panorama(&job_path).map(AssetPayload::Image)
        });
    }

    /// OBJ geometry with materials from an explicit MTL file
    pub fn request_model(&mut self, slot: AssetSlot, obj_path: PathBuf, mtl_path: PathBuf) {
        let job_path = obj_path.clone();
        self.spawn(slot, obj_path, move || {
            model::load_obj_with_mtl(&job_path, &mtl_path).map(AssetPayload::Model)
        });
    }

    /// Runs `job` on a worker thread
    pub fn spawn<F>(&mut self, slot: AssetSlot, path: PathBuf, job: F)
    where
        F: FnOnce() -> Result<AssetPayload> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let spawned = thread::Builder::new()
            .name(format!("asset-{:?}", slot))
            .spawn(move || {
                // receiver gone means the loader was dropped
                let _ = sender.send(job());
            });

        match spawned {
            Ok(_) => {
                debug!("Loading {:?} from '{}'", slot, path.display());
                self.pending.push(PendingLoad { slot, path, receiver });
            }
            Err(e) => warn!("Could not start loader for '{}': {}", path.display(), e),
        }
    }

    /// Collects loads that finished since the last poll
    pub fn poll(&mut self) -> Vec<LoadedAsset> {
        let mut finished = Vec::new();

        self.pending.retain_mut(|load| match load.receiver.try_recv() {
            Ok(None) => true,
            Ok(Some(Ok(payload))) => {
                info!("Loaded {:?} from '{}'", load.slot, load.path.display());
                finished.push(LoadedAsset {
                    slot: load.slot,
                    path: load.path.clone(),
                    payload,
                });
                false
            }
            Ok(Some(Err(e))) => {
                warn!("Failed to load {:?}: {}", load.slot, e);
                false
            }
            Err(oneshot::Canceled) => {
                warn!("Loader for '{}' stopped without a result", load.path.display());
                false
            }
        });

        finished
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
