//! presley-core: batch media acquisition and pressing pipeline.
//!
//! A job list fans out into per-job pipelines (acquire, assemble,
//! normalize, tag, place) that run concurrently under explicit
//! concurrency limits. Each stage delegates to an external collaborator
//! behind a trait; completion markers make reruns cheap.

pub mod config;
pub mod converter;
pub mod fetcher;
pub mod jobspec;
pub mod pipeline;
pub mod placer;
pub mod scheduler;
pub mod tagger;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use jobspec::{parse_job_list, parse_job_list_str, JobKind, JobSpec, ParsedJobs};
pub use pipeline::{
    FailureCategory, JobPipeline, JobStatus, PipelineRun, PipelineSettings, StageExecutor, StageId,
};
pub use scheduler::{BatchScheduler, JobOutcome, RunReport, SchedulerConfig};
