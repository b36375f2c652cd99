//! Per-job pipeline driver.
//!
//! Drives one PipelineRun through its stage sequence: predecessor gating,
//! resumption from completion markers, bounded retries for transient
//! failures, per-stage timeouts, and cancellation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};

use super::error::StageError;
use super::executor::StageExecutor;
use super::markers;
use super::types::{
    JobStatus, PipelineRun, SkipReason, StageClass, StageId, StageStatus,
};

/// Behavior knobs threaded from the scheduler into every pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub resume: bool,
    pub overwrite: bool,
    /// Remove the working directory (and its markers) after success.
    /// Off by default: markers are what make the next run cheap.
    pub clean_work_on_success: bool,
    pub max_stage_retries: u32,
    pub stage_timeout: Duration,
    pub retry_backoff: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            resume: true,
            overwrite: false,
            clean_work_on_success: false,
            max_stage_retries: 2,
            stage_timeout: Duration::from_secs(3600),
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Executes one job's stage sequence to a terminal status.
pub struct JobPipeline {
    executor: Arc<StageExecutor>,
    settings: PipelineSettings,
    fetch_slots: Arc<Semaphore>,
    transcode_slots: Arc<Semaphore>,
    cancel_rx: watch::Receiver<bool>,
}

impl JobPipeline {
    pub fn new(
        executor: Arc<StageExecutor>,
        settings: PipelineSettings,
        fetch_slots: Arc<Semaphore>,
        transcode_slots: Arc<Semaphore>,
        cancel_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            executor,
            settings,
            fetch_slots,
            transcode_slots,
            cancel_rx,
        }
    }

    fn cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Runs the job to a terminal status. Statuses in `run` reflect the
    /// final state of every stage.
    pub async fn run(self, run: &mut PipelineRun) -> JobStatus {
        let job_id = run.job_id();

        if self.cancelled() {
            tracing::info!(job_id = %job_id, "cancelled before start");
            return JobStatus::Cancelled;
        }

        if let Err(e) = tokio::fs::create_dir_all(&run.work_dir).await {
            tracing::error!(job_id = %job_id, error = %e, "failed to create working directory");
            return JobStatus::Failed {
                stage: "workdir".to_string(),
                category: super::types::FailureCategory::Tool,
            };
        }

        let mut first_failure = None;

        for i in 0..run.stages.len() {
            let stage = run.stages[i].id;

            if self.cancelled() {
                tracing::info!(job_id = %job_id, stage = stage.as_str(), "cancelled between stages");
                return JobStatus::Cancelled;
            }

            if !run.predecessors_ok(stage) {
                run.set_status(stage, StageStatus::Skipped(SkipReason::DependencyFailed));
                continue;
            }

            if self.settings.resume {
                if let Some(outputs) = self.try_resume(stage, run).await {
                    tracing::info!(job_id = %job_id, stage = stage.as_str(), "resumed from prior run");
                    run.artifacts.apply(stage, &outputs);
                    run.set_status(stage, StageStatus::Skipped(SkipReason::Resumed));
                    continue;
                }
            }

            run.set_status(stage, StageStatus::Running);
            let inputs = run.artifacts.inputs_for(stage, &run.spec);
            let fingerprint =
                markers::fingerprint(stage, &run.spec.source_locator, &inputs).await;

            match self.run_stage(stage, &job_id, run).await {
                Ok(outputs) => {
                    run.artifacts.apply(stage, &outputs);
                    run.set_status(stage, StageStatus::Succeeded);
                    if let Err(e) =
                        markers::store(&run.work_dir, stage, fingerprint, outputs).await
                    {
                        tracing::warn!(
                            job_id = %job_id,
                            stage = stage.as_str(),
                            error = %e,
                            "failed to write completion marker"
                        );
                    }
                }
                Err(StageError::Cancelled) => {
                    run.set_status(stage, StageStatus::Failed);
                    tracing::info!(job_id = %job_id, stage = stage.as_str(), "cancelled mid-stage");
                    return JobStatus::Cancelled;
                }
                Err(e) => {
                    let category = e.category();
                    tracing::error!(
                        job_id = %job_id,
                        stage = stage.as_str(),
                        category = category.as_str(),
                        error = %e,
                        "stage failed"
                    );
                    run.set_status(stage, StageStatus::Failed);
                    if first_failure.is_none() {
                        first_failure = Some((stage, category));
                    }
                }
            }
        }

        if let Some((stage, category)) = first_failure {
            // succeeded stages' artifacts and markers stay on disk for
            // diagnosis and resumption
            return JobStatus::Failed {
                stage: stage.as_str().to_string(),
                category,
            };
        }

        let all_resumed = run.all_resumed();
        if self.settings.clean_work_on_success {
            if let Err(e) = tokio::fs::remove_dir_all(&run.work_dir).await {
                tracing::warn!(job_id = %job_id, error = %e, "failed to clean working directory");
            }
        }

        if all_resumed {
            JobStatus::Resumed
        } else {
            JobStatus::Succeeded
        }
    }

    /// Checks the resumption contract for one stage: a marker whose
    /// fingerprint matches the current inputs and whose outputs are still
    /// on disk and non-empty.
    async fn try_resume(
        &self,
        stage: StageId,
        run: &PipelineRun,
    ) -> Option<BTreeMap<String, PathBuf>> {
        let marker = markers::load(&run.work_dir, stage).await?;
        let inputs = run.artifacts.inputs_for(stage, &run.spec);
        let fingerprint = markers::fingerprint(stage, &run.spec.source_locator, &inputs).await;
        if marker.fingerprint != fingerprint {
            return None;
        }
        if !markers::outputs_intact(&marker).await {
            return None;
        }
        Some(marker.outputs)
    }

    /// Runs one stage with bounded retries for transient failures.
    async fn run_stage(
        &self,
        stage: StageId,
        job_id: &str,
        run: &PipelineRun,
    ) -> Result<BTreeMap<String, PathBuf>, StageError> {
        let max_attempts = 1 + self.settings.max_stage_retries;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt_stage(stage, job_id, run).await {
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        job_id = %job_id,
                        stage = stage.as_str(),
                        attempt,
                        error = %e,
                        "transient stage failure, retrying"
                    );
                    tokio::time::sleep(self.settings.retry_backoff).await;
                }
                other => return other,
            }
        }
    }

    /// One attempt: acquire the stage's concurrency permit, run the
    /// boundary call under the stage timeout, bail out on cancellation.
    async fn attempt_stage(
        &self,
        stage: StageId,
        job_id: &str,
        run: &PipelineRun,
    ) -> Result<BTreeMap<String, PathBuf>, StageError> {
        let semaphore = match stage.class() {
            StageClass::Network => Some(Arc::clone(&self.fetch_slots)),
            StageClass::Transcode => Some(Arc::clone(&self.transcode_slots)),
            StageClass::Light => None,
        };

        let work = async {
            let _permit = match semaphore {
                Some(s) => Some(
                    s.acquire_owned()
                        .await
                        .map_err(|_| StageError::Cancelled)?,
                ),
                None => None,
            };

            let call = self.executor.execute(
                stage,
                job_id,
                &run.spec,
                &run.artifacts,
                &run.work_dir,
                self.settings.overwrite,
            );
            match tokio::time::timeout(self.settings.stage_timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(StageError::StageTimeout {
                    timeout_secs: self.settings.stage_timeout.as_secs(),
                }),
            }
        };

        tokio::select! {
            _ = wait_cancelled(self.cancel_rx.clone()) => Err(StageError::Cancelled),
            result = work => result,
        }
    }
}

/// Resolves when the cancellation flag flips to true; never resolves if
/// cancellation can no longer arrive.
async fn wait_cancelled(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
