//! Error types for the collaboration core.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollabError {
    #[error("failed to create shared directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CollabError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
