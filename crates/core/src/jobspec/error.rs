//! Error types for the job-list parser.

use std::path::PathBuf;
use thiserror::Error;

/// A defect in a single job-list row.
///
/// Row errors are collected exhaustively; one bad row never aborts the batch.
#[derive(Debug, Clone, Error)]
#[error("row {line}: {reason}")]
pub struct RowError {
    /// 1-based line number in the input file.
    pub line: usize,
    pub reason: String,
}

impl RowError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// A non-fatal observation about the job list.
#[derive(Debug, Clone)]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

/// Errors that prevent reading the job list at all.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read job list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
