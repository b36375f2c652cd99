//! Batch scheduler implementation.
//!
//! Fans a job list out into concurrent pipelines under two independent
//! concurrency limits (network acquisition vs transcode work), collects
//! every terminal status, and aggregates the run report. A single job's
//! failure never aborts its siblings; the batch always runs to
//! completion over all jobs.

use chrono::Utc;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tracing::{error, info};

use crate::jobspec::JobSpec;
use crate::pipeline::{
    FailureCategory, JobPipeline, JobStatus, PipelineRun, PipelineSettings, StageExecutor,
};

use super::config::SchedulerConfig;
use super::report::{JobOutcome, RunReport};

/// Runs many job pipelines concurrently and aggregates their outcomes.
pub struct BatchScheduler {
    config: SchedulerConfig,
    executor: Arc<StageExecutor>,
    work_root: PathBuf,
    fetch_slots: Arc<Semaphore>,
    transcode_slots: Arc<Semaphore>,
    cancel_tx: watch::Sender<bool>,
}

impl BatchScheduler {
    pub fn new(config: SchedulerConfig, executor: Arc<StageExecutor>, work_root: PathBuf) -> Self {
        let fetch_slots = Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1)));
        let transcode_slots = Arc::new(Semaphore::new(config.max_concurrent_transcodes.max(1)));
        let (cancel_tx, _) = watch::channel(false);

        Self {
            config,
            executor,
            work_root,
            fetch_slots,
            transcode_slots,
            cancel_tx,
        }
    }

    /// Signals cancellation to every running pipeline. Jobs that already
    /// finished keep their terminal status; everything else ends
    /// Cancelled.
    pub fn cancel(&self) {
        info!("cancelling batch");
        let _ = self.cancel_tx.send(true);
    }

    fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            resume: self.config.resume,
            overwrite: self.config.overwrite,
            clean_work_on_success: self.config.clean_work_on_success,
            max_stage_retries: self.config.max_stage_retries,
            stage_timeout: std::time::Duration::from_secs(self.config.stage_timeout_secs),
            retry_backoff: std::time::Duration::from_millis(self.config.retry_backoff_ms),
        }
    }

    /// Runs the whole batch to completion and returns the report, with
    /// exactly one entry per input job, ordered by input index.
    pub async fn run(&self, specs: Vec<JobSpec>) -> RunReport {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(run_id = %run_id, jobs = specs.len(), "starting batch");

        let mut handles = Vec::with_capacity(specs.len());
        for spec in specs {
            let spec = Arc::new(spec);
            let pipeline = JobPipeline::new(
                Arc::clone(&self.executor),
                self.settings(),
                Arc::clone(&self.fetch_slots),
                Arc::clone(&self.transcode_slots),
                self.cancel_tx.subscribe(),
            );
            let work_root = self.work_root.clone();

            let handle = tokio::spawn(async move {
                let mut run = PipelineRun::new(Arc::clone(&spec), &work_root);
                let status = pipeline.run(&mut run).await;
                JobOutcome {
                    index: spec.index,
                    track_title: spec.track_title.clone(),
                    kind: spec.kind,
                    status,
                }
            });
            handles.push(handle);
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (position, result) in join_all(handles).await.into_iter().enumerate() {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(position, error = %e, "pipeline task aborted");
                    outcomes.push(JobOutcome {
                        index: position,
                        track_title: "<unknown>".to_string(),
                        kind: crate::jobspec::JobKind::AudioOnly,
                        status: JobStatus::Failed {
                            stage: "internal".to_string(),
                            category: FailureCategory::Tool,
                        },
                    });
                }
            }
        }
        outcomes.sort_by_key(|o| o.index);

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(
            succeeded = report.succeeded(),
            resumed = report.resumed(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            "batch finished"
        );
        report
    }
}
