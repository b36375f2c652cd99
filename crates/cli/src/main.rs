mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use presley_core::converter::{Converter, FfmpegConverter};
use presley_core::fetcher::{Fetcher, YtdlpFetcher};
use presley_core::jobspec::parse_job_list;
use presley_core::placer::{FsPlacer, Placer};
use presley_core::scheduler::BatchScheduler;
use presley_core::tagger::{FfmpegTagger, Tagger};
use presley_core::{load_config, validate_config, Config, StageExecutor};

/// Batch media acquisition and pressing pipeline.
#[derive(Debug, Parser)]
#[command(name = "presley", version, about)]
struct Cli {
    /// Job list file (one job per line, `#` starts a comment).
    #[arg(short, long)]
    input: PathBuf,

    /// Config file (TOML). Flags override config values.
    #[arg(short, long, env = "PRESLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Root of the output tree.
    #[arg(short, long)]
    output_root: Option<PathBuf>,

    /// Directory cover image filenames are resolved against.
    #[arg(long)]
    cover_dir: Option<PathBuf>,

    /// Root for per-job working directories.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Maximum simultaneous acquisitions.
    #[arg(long)]
    fetch_slots: Option<usize>,

    /// Maximum simultaneous transcodes.
    #[arg(long)]
    transcode_slots: Option<usize>,

    /// Re-run every stage even when completion markers are valid.
    #[arg(long)]
    no_resume: bool,

    /// Replace existing destinations instead of failing on collision.
    #[arg(long)]
    overwrite: bool,

    /// Remove working directories after success, giving up cheap reruns.
    #[arg(long)]
    clean_work: bool,

    /// Print the run report as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Defaults, overridden by the config file, overridden by flags.
fn effective_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(root) = &cli.output_root {
        config.placer.output_root = root.clone();
    }
    if let Some(dir) = &cli.cover_dir {
        config.paths.cover_dir = dir.clone();
    }
    if let Some(dir) = &cli.work_dir {
        config.paths.work_root = dir.clone();
    }
    if let Some(slots) = cli.fetch_slots {
        config.scheduler.max_concurrent_fetches = slots;
    }
    if let Some(slots) = cli.transcode_slots {
        config.scheduler.max_concurrent_transcodes = slots;
    }
    if cli.no_resume {
        config.scheduler.resume = false;
    }
    if cli.overwrite {
        config.scheduler.overwrite = true;
    }
    if cli.clean_work {
        config.scheduler.clean_work_on_success = true;
    }

    validate_config(&config).context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let config = effective_config(&cli)?;

    let parsed = parse_job_list(&cli.input, &config.paths.cover_dir)
        .with_context(|| format!("failed to read job list {}", cli.input.display()))?;

    for row_error in &parsed.row_errors {
        error!("{row_error}");
    }
    for warning in &parsed.warnings {
        warn!("row {}: {}", warning.line, warning.message);
    }
    if parsed.jobs.is_empty() {
        info!("no runnable jobs in {}", cli.input.display());
        return Ok(parsed.row_errors.is_empty());
    }
    info!(
        jobs = parsed.jobs.len(),
        rejected = parsed.row_errors.len(),
        "job list parsed"
    );

    let fetcher = YtdlpFetcher::new(config.fetcher.clone());
    let converter = FfmpegConverter::new(config.converter.clone());
    let tagger = FfmpegTagger::new(config.tagger.clone());
    let placer = FsPlacer::new(config.placer.clone());

    fetcher.validate().await.context("downloader not ready")?;
    converter.validate().await.context("converter not ready")?;
    tagger.validate().await.context("tagger not ready")?;
    placer.validate().await.context("output tree not ready")?;

    let executor = Arc::new(StageExecutor::new(
        Arc::new(fetcher),
        Arc::new(converter),
        Arc::new(tagger),
        Arc::new(placer),
    ));
    let scheduler = Arc::new(BatchScheduler::new(
        config.scheduler.clone(),
        executor,
        config.paths.work_root.clone(),
    ));

    // ctrl-c cancels the batch; finished jobs keep their status
    let cancel = Arc::clone(&scheduler);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling batch");
            cancel.cancel();
        }
    });

    let report = scheduler.run(parsed.jobs).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_table(&report));
    }

    Ok(report.is_success() && parsed.row_errors.is_empty())
}
