//! Resumption integration tests.
//!
//! Rerunning a finished job list must be cheap: completion markers let
//! every stage skip, and a lost marker reruns only the affected tail.

use std::sync::Arc;
use tempfile::TempDir;

use presley_core::jobspec::{JobKind, JobSpec};
use presley_core::pipeline::{marker_path, JobStatus, PipelineRun, StageExecutor, StageId};
use presley_core::scheduler::{BatchScheduler, SchedulerConfig};
use presley_core::testing::{MockConverter, MockFetcher, MockPlacer, MockTagger};

struct TestHarness {
    fetcher: MockFetcher,
    converter: MockConverter,
    tagger: MockTagger,
    placer: MockPlacer,
    scheduler: Arc<BatchScheduler>,
    work: TempDir,
    _out: TempDir,
}

impl TestHarness {
    fn with_config(config: SchedulerConfig) -> Self {
        let work = TempDir::new().expect("work dir");
        let out = TempDir::new().expect("out dir");

        let fetcher = MockFetcher::new();
        let converter = MockConverter::new();
        let tagger = MockTagger::new();
        let placer = MockPlacer::new(out.path().to_path_buf());

        let executor = Arc::new(StageExecutor::new(
            Arc::new(fetcher.clone()),
            Arc::new(converter.clone()),
            Arc::new(tagger.clone()),
            Arc::new(placer.clone()),
        ));
        let scheduler = Arc::new(BatchScheduler::new(
            config,
            executor,
            work.path().to_path_buf(),
        ));

        Self {
            fetcher,
            converter,
            tagger,
            placer,
            scheduler,
            work,
            _out: out,
        }
    }

    fn new() -> Self {
        Self::with_config(SchedulerConfig {
            retry_backoff_ms: 5,
            ..Default::default()
        })
    }
}

fn specs() -> Vec<JobSpec> {
    let base = |index: usize, kind: JobKind, locator: &str, title: &str| JobSpec {
        index,
        kind,
        source_locator: locator.to_string(),
        album_artist: "Queen Singer".to_string(),
        album_name: "Immortal Songs".to_string(),
        track_title: title.to_string(),
        track_artist: "Queen Singer".to_string(),
        genre: "Pop".to_string(),
        year: 1999,
        cover_image: None,
    };
    vec![
        base(0, JobKind::AudioOnly, "loc-1", "Every Night"),
        base(1, JobKind::VideoOnly, "loc-2", "Every Morning"),
    ]
}

#[tokio::test]
async fn test_second_run_skips_every_stage() {
    let harness = TestHarness::new();

    let first = harness.scheduler.run(specs()).await;
    assert!(first.is_success());
    assert_eq!(first.succeeded(), 2);

    let fetches = harness.fetcher.fetch_count().await;
    let conversions = harness.converter.call_count().await;
    let tags = harness.tagger.tag_count().await;
    let places = harness.placer.place_count().await;

    let second = harness.scheduler.run(specs()).await;
    assert!(second.is_success());
    assert_eq!(second.resumed(), 2, "every job fully resumed");
    assert_eq!(second.succeeded(), 0);

    // zero redundant stage executions
    assert_eq!(harness.fetcher.fetch_count().await, fetches);
    assert_eq!(harness.converter.call_count().await, conversions);
    assert_eq!(harness.tagger.tag_count().await, tags);
    assert_eq!(harness.placer.place_count().await, places);
}

#[tokio::test]
async fn test_lost_marker_reruns_only_that_stage() {
    let harness = TestHarness::new();
    let jobs = vec![specs().remove(0)];

    let first = harness.scheduler.run(jobs.clone()).await;
    assert!(first.is_success());

    // drop the normalize marker; acquire and assemble evidence stays
    let run = PipelineRun::new(Arc::new(jobs[0].clone()), harness.work.path());
    tokio::fs::remove_file(marker_path(&run.work_dir, StageId::NormalizeAudio))
        .await
        .expect("marker exists after first run");

    let fetches = harness.fetcher.fetch_count().await;
    let transcodes = harness.converter.transcode_count().await;
    let normalizes = harness.converter.normalize_count().await;

    let second = harness.scheduler.run(jobs).await;
    assert!(second.is_success());
    // not everything was skipped, so the job reports Succeeded
    assert_eq!(second.outcomes[0].status, JobStatus::Succeeded);

    assert_eq!(harness.fetcher.fetch_count().await, fetches);
    assert_eq!(harness.converter.transcode_count().await, transcodes);
    assert_eq!(
        harness.converter.normalize_count().await,
        normalizes + 1,
        "only the stage with lost evidence reruns"
    );
}

#[tokio::test]
async fn test_missing_artifact_invalidates_marker() {
    let harness = TestHarness::new();
    let jobs = vec![specs().remove(0)];

    harness.scheduler.run(jobs.clone()).await;

    // the marker survives but its output artifact is gone
    let run = PipelineRun::new(Arc::new(jobs[0].clone()), harness.work.path());
    tokio::fs::remove_file(run.work_dir.join("assembled.mp3"))
        .await
        .expect("assembled artifact exists after first run");

    let transcodes = harness.converter.transcode_count().await;
    let second = harness.scheduler.run(jobs).await;
    assert!(second.is_success());
    assert_eq!(
        harness.converter.transcode_count().await,
        transcodes + 1,
        "stage reruns when its recorded output is missing"
    );
}

#[tokio::test]
async fn test_resume_disabled_reruns_everything() {
    let harness = TestHarness::with_config(SchedulerConfig {
        resume: false,
        overwrite: true,
        retry_backoff_ms: 5,
        ..Default::default()
    });
    let jobs = vec![specs().remove(0)];

    harness.scheduler.run(jobs.clone()).await;
    let fetches = harness.fetcher.fetch_count().await;

    let second = harness.scheduler.run(jobs).await;
    assert!(second.is_success());
    assert_eq!(second.succeeded(), 1);
    assert_eq!(
        harness.fetcher.fetch_count().await,
        fetches * 2,
        "no skipping without resumption"
    );
}
