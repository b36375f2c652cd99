//! Error types for the placer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while placing an artifact.
#[derive(Debug, Error)]
pub enum PlacerError {
    /// Destination already exists and overwrite is disabled.
    #[error("destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    /// Source artifact is missing.
    #[error("source artifact not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Destination directory could not be created.
    #[error("failed to create destination directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cross-device copy fallback failed.
    #[error("failed to copy {from} to {to}: {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Other I/O fault during placement.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlacerError {
    pub fn copy_failed(from: PathBuf, to: PathBuf, source: std::io::Error) -> Self {
        Self::CopyFailed { from, to, source }
    }
}
