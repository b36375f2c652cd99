//! Run report rendering.

use presley_core::pipeline::JobStatus;
use presley_core::scheduler::RunReport;

/// Renders the report as a plain-text table, one row per input job.
pub fn render_table(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "run {}: {} jobs - {} succeeded, {} resumed, {} failed, {} cancelled\n",
        report.run_id,
        report.outcomes.len(),
        report.succeeded(),
        report.resumed(),
        report.failed(),
        report.cancelled(),
    ));

    let title_width = report
        .outcomes
        .iter()
        .map(|o| o.track_title.len())
        .max()
        .unwrap_or(5)
        .max(5);

    out.push_str(&format!(
        "{:>4}  {:4}  {:title_width$}  {}\n",
        "#", "kind", "title", "status"
    ));
    for outcome in &report.outcomes {
        out.push_str(&format!(
            "{:>4}  {:4}  {:title_width$}  {}\n",
            outcome.index,
            outcome.kind.as_str(),
            outcome.track_title,
            status_cell(&outcome.status),
        ));
    }
    out
}

fn status_cell(status: &JobStatus) -> String {
    match status {
        JobStatus::Succeeded => "succeeded".to_string(),
        JobStatus::Resumed => "resumed".to_string(),
        JobStatus::Failed { stage, category } => {
            format!("failed at {stage} ({})", category.as_str())
        }
        JobStatus::Cancelled => "cancelled".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use presley_core::jobspec::JobKind;
    use presley_core::pipeline::FailureCategory;
    use presley_core::scheduler::JobOutcome;

    fn report() -> RunReport {
        let now = Utc::now();
        RunReport {
            run_id: "run-1".to_string(),
            started_at: now,
            finished_at: now,
            outcomes: vec![
                JobOutcome {
                    index: 0,
                    track_title: "Every Night".to_string(),
                    kind: JobKind::AudioOnly,
                    status: JobStatus::Succeeded,
                },
                JobOutcome {
                    index: 1,
                    track_title: "Every Morning".to_string(),
                    kind: JobKind::VideoOnly,
                    status: JobStatus::Failed {
                        stage: "normalize-video".to_string(),
                        category: FailureCategory::Tool,
                    },
                },
            ],
        }
    }

    #[test]
    fn test_table_has_one_row_per_job() {
        let table = render_table(&report());
        let rows: Vec<&str> = table.lines().collect();
        // header line, column line, two job rows
        assert_eq!(rows.len(), 4);
        assert!(rows[0].contains("1 succeeded"));
        assert!(rows[0].contains("1 failed"));
    }

    #[test]
    fn test_failure_row_names_stage_and_category() {
        let table = render_table(&report());
        assert!(table.contains("failed at normalize-video (tool)"));
    }

    #[test]
    fn test_rows_keep_input_order() {
        let table = render_table(&report());
        let night = table.find("Every Night").unwrap();
        let morning = table.find("Every Morning").unwrap();
        assert!(night < morning);
    }
}
