//! Batch run report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::jobspec::JobKind;
use crate::pipeline::JobStatus;

/// Terminal outcome of one job, in report form.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    /// Original input position; the report is sorted by this.
    pub index: usize,
    pub track_title: String,
    pub kind: JobKind,
    #[serde(flatten)]
    pub status: JobStatus,
}

/// Aggregated, ordered outcome summary of a full batch.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<JobOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Succeeded))
    }

    pub fn resumed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Resumed))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Cancelled))
    }

    /// True only when every job reached Succeeded or Resumed.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_success())
    }

    fn count(&self, predicate: impl Fn(&JobStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|o| predicate(&o.status))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FailureCategory;

    fn report(statuses: Vec<JobStatus>) -> RunReport {
        let now = Utc::now();
        RunReport {
            run_id: "run-1".to_string(),
            started_at: now,
            finished_at: now,
            outcomes: statuses
                .into_iter()
                .enumerate()
                .map(|(index, status)| JobOutcome {
                    index,
                    track_title: format!("track {index}"),
                    kind: JobKind::AudioOnly,
                    status,
                })
                .collect(),
        }
    }

    #[test]
    fn test_counts_and_success() {
        let r = report(vec![
            JobStatus::Succeeded,
            JobStatus::Resumed,
            JobStatus::Failed {
                stage: "acquire".to_string(),
                category: FailureCategory::Tool,
            },
            JobStatus::Cancelled,
        ]);
        assert_eq!(r.succeeded(), 1);
        assert_eq!(r.resumed(), 1);
        assert_eq!(r.failed(), 1);
        assert_eq!(r.cancelled(), 1);
        assert!(!r.is_success());
    }

    #[test]
    fn test_all_resumed_is_success() {
        let r = report(vec![JobStatus::Resumed, JobStatus::Succeeded]);
        assert!(r.is_success());
    }

    #[test]
    fn test_serializes_failure_details() {
        let r = report(vec![JobStatus::Failed {
            stage: "normalize-audio".to_string(),
            category: FailureCategory::Transient,
        }]);
        let json = serde_json::to_value(&r).unwrap();
        let outcome = &json["outcomes"][0];
        assert_eq!(outcome["status"], "failed");
        assert_eq!(outcome["stage"], "normalize-audio");
        assert_eq!(outcome["category"], "transient");
    }
}
