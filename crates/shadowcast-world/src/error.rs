//! Error types for world loading and validation.

use thiserror::Error;

/// Errors that can occur while loading or validating a world.
#[derive(Error, Debug)]
pub enum WorldError {
    /// I/O failure while reading a world file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed world JSON.
    #[error("invalid world JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A record refers to an element that does not exist.
    #[error("{what} index {index} out of range (len {len})")]
    InvalidReference {
        /// Kind of element being referenced.
        what: &'static str,
        /// Offending index.
        index: usize,
        /// Number of elements available.
        len: usize,
    },

    /// A BSP node is reachable from its own subtree.
    #[error("BSP node {node} is its own descendant")]
    CyclicTree {
        /// A node on the cycle.
        node: usize,
    },

    /// A field holds a value outside its permitted range.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Result type for world operations.
pub type Result<T> = std::result::Result<T, WorldError>;
