//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while acquiring source streams.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The locator does not resolve to a single available item.
    #[error("source not found: {locator}")]
    NotFound { locator: String },

    /// The source refused the request due to rate limiting.
    #[error("rate limited by source: {locator}")]
    RateLimited { locator: String },

    /// Network-level failure talking to the source.
    #[error("network failure: {reason}")]
    Network { reason: String },

    /// The fetch exceeded its time budget.
    #[error("fetch timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Downloader binary not found.
    #[error("downloader not found at path: {path}")]
    DownloaderNotFound { path: PathBuf },

    /// The downloader reported an unrecoverable error.
    #[error("downloader failed: {reason}")]
    Tool {
        reason: String,
        stderr: Option<String>,
    },

    /// I/O error during the fetch.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    pub fn tool(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Tool {
            reason: reason.into(),
            stderr,
        }
    }

    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Network { .. } | Self::Timeout { .. } | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::network("reset").is_transient());
        assert!(FetchError::Timeout { timeout_secs: 5 }.is_transient());
        assert!(FetchError::RateLimited {
            locator: "x".into()
        }
        .is_transient());
        assert!(!FetchError::NotFound {
            locator: "x".into()
        }
        .is_transient());
        assert!(!FetchError::tool("boom", None).is_transient());
    }
}
