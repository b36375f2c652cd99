//! Error types for the tagger module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while tagging.
#[derive(Debug, Error)]
pub enum TagError {
    /// FFmpeg binary not found.
    #[error("ffmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Input artifact not found.
    #[error("input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Cover image not found.
    #[error("cover image not found: {path}")]
    CoverNotFound { path: PathBuf },

    /// The tool reported an unrecoverable failure.
    #[error("tagging failed: {reason}")]
    TagFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The operation exceeded its time budget.
    #[error("tagging timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during tagging.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TagError {
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::TagFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}
