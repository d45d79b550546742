//! Engine error types
//!
//! Per-mapping, per-script, and per-node faults are contained and logged
//! where they occur; these types surface only from the store boundary and
//! the scene backend.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or saving persisted mapping files
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Serialize error for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
}

/// Errors from the scene backend when materializing overlay nodes.
///
/// The backend is expected to fall back to a placeholder texture on image
/// load failure; errors that do surface abort only the affected node.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load texture {path}")]
    Texture { path: String },

    #[error("backend error: {0}")]
    Backend(String),
}
