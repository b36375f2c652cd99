//! The job pipeline: stage state machine, completion markers, and the
//! per-job driver.

mod error;
mod executor;
mod markers;
mod run;
mod types;

pub use error::StageError;
pub use executor::StageExecutor;
pub use markers::{fingerprint, load as load_marker, marker_path, CompletionMarker};
pub use run::{JobPipeline, PipelineSettings};
pub use types::{
    ArtifactSet, FailureCategory, JobStatus, PipelineRun, SkipReason, StageClass, StageId,
    StageSlot, StageStatus,
};
