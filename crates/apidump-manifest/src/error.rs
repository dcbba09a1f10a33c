use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ManifestError>;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid manifest {path}: {source}")]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No module named '{0}'")]
    ModuleNotFound(String),

    #[error("Invalid module name: {0:?}")]
    InvalidModuleName(String),

    #[error("Cannot resolve base class '{base}': {reason}")]
    UnresolvedBase { base: String, reason: String },

    #[error("Base class cycle through '{0}'")]
    BaseCycle(String),
}
