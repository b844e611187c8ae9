use anyhow::{Context, Result};
use clap::Parser;
use incidentscraper::{run, FailurePolicy, PipelineConfig};
use std::{path::PathBuf, time::Duration};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Turn raw wildfire incident snapshots into one deduplicated Parquet dataset"
)]
struct Args {
    /// Directory tree holding the raw snapshots (must exist)
    input_dir: PathBuf,
    /// Directory for the dataset and run report (created if absent)
    output_dir: PathBuf,
    /// Worker threads; defaults to available CPUs minus one
    #[arg(long, env = "INCIDENTSCRAPER_WORKERS")]
    workers: Option<usize>,
    /// Give up on a single snapshot after this many seconds
    #[arg(long, env = "INCIDENTSCRAPER_TASK_TIMEOUT_SECS")]
    task_timeout_secs: Option<u64>,
    /// Snapshot file extension
    #[arg(long, default_value = "snapshot")]
    extension: String,
    /// Leave failing snapshots out and list them in the report instead of aborting
    #[arg(long)]
    skip_failed: bool,
    /// Fail a snapshot when an optional field is present but malformed
    #[arg(long)]
    strict_optional: bool,
}

impl Args {
    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            workers: self.workers,
            task_timeout: self.task_timeout_secs.map(Duration::from_secs),
            extension: self.extension.clone(),
            failure_policy: if self.skip_failed {
                FailurePolicy::SkipAndReport
            } else {
                FailurePolicy::FailFast
            },
            strict_optional: self.strict_optional,
            ..PipelineConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) configure ────────────────────────────────────────────────
    let args = Args::parse();
    let config = args.config();
    info!(
        input = %args.input_dir.display(),
        output = %args.output_dir.display(),
        workers = config.effective_workers(),
        "making final data set from raw snapshots"
    );

    // ─── 3) run ──────────────────────────────────────────────────────
    let report = match run(&args.input_dir, &args.output_dir, &config) {
        Ok(report) => report,
        Err(e) => {
            let kind = e.kind();
            error!(kind = %kind, path = ?e.path(), error = %e, "pipeline failed");
            return Err(e).with_context(|| format!("pipeline failed ({kind})"));
        }
    };

    if !report.failures.is_empty() {
        info!(skipped = report.failures.len(), "some snapshots were skipped, see report");
    }
    info!(
        rows = report.rows_written,
        duplicates = report.duplicates_dropped,
        dataset = %report.dataset_path.display(),
        "finished successfully"
    );
    Ok(())
}
