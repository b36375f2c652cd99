//! Stage failure type and category mapping.

use thiserror::Error;

use super::types::FailureCategory;
use crate::converter::ConverterError;
use crate::fetcher::FetchError;
use crate::placer::PlacerError;
use crate::tagger::TagError;

/// A failed stage execution, wrapping the collaborator's own error.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Convert(#[from] ConverterError),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Place(#[from] PlacerError),

    /// The whole stage call exceeded the pipeline's per-stage budget.
    #[error("stage timed out after {timeout_secs} seconds")]
    StageTimeout { timeout_secs: u64 },

    /// A required input artifact was never produced.
    #[error("missing input artifact: {what}")]
    MissingArtifact { what: String },

    /// The run was cancelled while this stage was waiting or executing.
    #[error("stage cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError {
    /// Maps the failure onto the report taxonomy.
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::Fetch(e) => {
                if e.is_transient() {
                    FailureCategory::Transient
                } else {
                    FailureCategory::Tool
                }
            }
            Self::Convert(e) => {
                if e.is_transient() {
                    FailureCategory::Transient
                } else {
                    FailureCategory::Tool
                }
            }
            Self::Tag(e) => {
                if e.is_transient() {
                    FailureCategory::Transient
                } else {
                    FailureCategory::Tool
                }
            }
            Self::Place(_) => FailureCategory::Placement,
            Self::StageTimeout { .. } => FailureCategory::Transient,
            Self::MissingArtifact { .. } => FailureCategory::Tool,
            Self::Cancelled => FailureCategory::Cancelled,
            Self::Io(_) => FailureCategory::Transient,
        }
    }

    /// Transient failures are eligible for automatic retry.
    pub fn is_transient(&self) -> bool {
        self.category() == FailureCategory::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        let not_found = StageError::Fetch(FetchError::NotFound {
            locator: "x".into(),
        });
        assert_eq!(not_found.category(), FailureCategory::Tool);

        let rate = StageError::Fetch(FetchError::RateLimited {
            locator: "x".into(),
        });
        assert_eq!(rate.category(), FailureCategory::Transient);
        assert!(rate.is_transient());

        let collision = StageError::Place(PlacerError::DestinationExists {
            path: "/out".into(),
        });
        assert_eq!(collision.category(), FailureCategory::Placement);
        assert!(!collision.is_transient());

        assert_eq!(
            StageError::Cancelled.category(),
            FailureCategory::Cancelled
        );
        assert_eq!(
            StageError::StageTimeout { timeout_secs: 1 }.category(),
            FailureCategory::Transient
        );
    }
}
