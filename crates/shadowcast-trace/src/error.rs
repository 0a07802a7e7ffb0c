//! Error types for engine initialization.

use std::fmt;

use shadowcast_world::WorldError;
use thiserror::Error;

/// Number of entries placed in each occlusion class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassSizes {
    /// Faces in the sky group.
    pub sky: usize,
    /// Faces in the solid group.
    pub solid: usize,
    /// Faces in the filtered group.
    pub filtered: usize,
    /// Leaf-boundary windings in the skip group.
    pub skip: usize,
}

impl fmt::Display for ClassSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sky={} solid={} filtered={} skip={}",
            self.sky, self.solid, self.filtered, self.skip
        )
    }
}

/// Errors that abort engine initialization.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The world failed validation.
    #[error("world: {0}")]
    World(#[from] WorldError),

    /// Settings file could not be read.
    #[error("settings I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid TOML for [`crate::TraceSettings`].
    #[error("settings parse: {0}")]
    Settings(#[from] toml::de::Error),

    /// A settings value is out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The backend was configured with ray masks, which the shadow policy
    /// does not use.
    #[error("ray masks must be disabled (built so far: {sizes})")]
    RayMaskEnabled {
        /// Class sizes built before the check failed.
        sizes: ClassSizes,
    },
}

/// Result type for engine initialization.
pub type Result<T> = std::result::Result<T, TraceError>;
