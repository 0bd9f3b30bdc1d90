//! Shadow map caching
//!
//! The shadow map is only re-rendered when something marks it stale: an
//! entity moved, was added or removed, the window was resized, or the frame
//! loop asked for a refresh.

use log::debug;

#[derive(Debug, Default)]
pub struct ShadowCache {
    is_valid: bool,
    log_updates: bool,
    regenerations: u64,
    reuses: u64,
}

impl ShadowCache {
    /// `log_updates` logs every regeneration and reuse at debug level
    pub fn new(log_updates: bool) -> Self {
        Self {
            log_updates,
            ..Default::default()
        }
    }

    /// Checks whether the shadow map must be re-rendered this frame
    pub fn needs_update(&mut self) -> bool {
        let stale = !self.is_valid;
        if !stale {
            self.reuses += 1;
            if self.log_updates {
                debug!("Shadow cache: reusing shadow map");
            }
        }
        stale
    }

    /// Records that the shadow map was just re-rendered
    pub fn mark_valid(&mut self) {
        self.is_valid = true;
        self.regenerations += 1;
        if self.log_updates {
            debug!("Shadow cache: regenerated shadow map (#{})", self.regenerations);
        }
    }

    pub fn invalidate(&mut self) {
        self.is_valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn get_stats(&self) -> ShadowCacheStats {
        ShadowCacheStats {
            is_valid: self.is_valid,
            regenerations: self.regenerations,
            reuses: self.reuses,
        }
    }
}

/// Statistics about the shadow cache for debugging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowCacheStats {
    pub is_valid: bool,
    pub regenerations: u64,
    pub reuses: u64,
}
