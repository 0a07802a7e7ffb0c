//! Tunables for scene construction and queries.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceError};

/// Engine settings, loadable from TOML. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    /// How far a sky test travels before giving up.
    pub max_sky_dist: f64,
    /// Maximum triangles per BVH leaf.
    pub bvh_leaf_size: usize,
    /// Capacity of batches made by [`crate::TraceEngine::ray_batch`].
    pub batch_capacity: usize,
    /// Enable backend ray masks. Initialization refuses this.
    pub ray_mask: bool,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            max_sky_dist: 1_000_000.0,
            bvh_leaf_size: 4,
            batch_capacity: 256,
            ray_mask: false,
        }
    }
}

impl TraceSettings {
    /// Parse settings from a TOML document and validate them.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a TOML file and validate them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_sky_dist <= 0.0 || !self.max_sky_dist.is_finite() {
            return Err(TraceError::InvalidSettings(format!(
                "max_sky_dist must be positive and finite, got {}",
                self.max_sky_dist
            )));
        }
        if self.bvh_leaf_size == 0 {
            return Err(TraceError::InvalidSettings(
                "bvh_leaf_size must be at least 1".into(),
            ));
        }
        if self.batch_capacity == 0 {
            return Err(TraceError::InvalidSettings(
                "batch_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
