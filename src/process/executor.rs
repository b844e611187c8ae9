// src/process/executor.rs

use rayon::prelude::*;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{FailurePolicy, PipelineConfig};
use crate::error::{ErrorKind, PipelineError, Result};
use crate::process::{fields::normalize, page::parse_page, record::IncidentRecord};

/// A file left out of the dataset under `FailurePolicy::SkipAndReport`.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

/// Records in discovery order, plus the files that were skipped.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<IncidentRecord>,
    pub failures: Vec<FileFailure>,
}

/// Read, parse and normalize one snapshot file.
pub fn extract_snapshot(path: &Path, strict_optional: bool) -> Result<IncidentRecord> {
    let html = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let raw = parse_page(&html)?;
    let record = normalize(&raw, strict_optional)?;
    debug!(path = %path.display(), incident = %record.incident_name, fields = record.len(), "extracted");
    Ok(record)
}

/// Run `extract_snapshot` on a helper thread and give up after `timeout`.
/// A timed-out helper is detached and finishes on its own.
fn extract_with_timeout(path: &Path, strict_optional: bool, timeout: Duration) -> Result<IncidentRecord> {
    let (tx, rx) = mpsc::sync_channel(1);
    let owned = path.to_path_buf();
    thread::Builder::new()
        .name("snapshot-task".into())
        .spawn(move || {
            let _ = tx.send(extract_snapshot(&owned, strict_optional));
        })
        .map_err(|e| PipelineError::io(path, e))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(PipelineError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(PipelineError::Parse(
            "snapshot task ended without a result".into(),
        )),
    }
}

fn run_task(path: &Path, config: &PipelineConfig) -> Result<IncidentRecord> {
    let result = match config.task_timeout {
        Some(timeout) => extract_with_timeout(path, config.strict_optional, timeout),
        None => extract_snapshot(path, config.strict_optional),
    };
    result.map_err(|e| e.in_snapshot(path))
}

/// Extract every snapshot on a dedicated pool of `config.effective_workers()` threads.
///
/// Output order follows `paths`. Under `FailFast` the first failure aborts the
/// run; under `SkipAndReport` failing files are logged and returned separately.
#[instrument(level = "info", skip_all, fields(files = paths.len()))]
pub fn extract_all(paths: &[PathBuf], config: &PipelineConfig) -> Result<Extraction> {
    let workers = config.effective_workers();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("extract-{i}"))
        .build()
        .map_err(|e| PipelineError::io(".", std::io::Error::other(e)))?;

    let start = Instant::now();
    info!(workers, "starting extraction");

    let extraction = match config.failure_policy {
        FailurePolicy::FailFast => {
            let records = pool.install(|| {
                paths
                    .par_iter()
                    .map(|p| run_task(p, config))
                    .collect::<Result<Vec<_>>>()
            });
            let records = records.inspect_err(|e| {
                error!(kind = %e.kind(), error = %e, "extraction aborted");
            })?;
            Extraction {
                records,
                failures: Vec::new(),
            }
        }
        FailurePolicy::SkipAndReport => {
            let results: Vec<Result<IncidentRecord>> =
                pool.install(|| paths.par_iter().map(|p| run_task(p, config)).collect());

            let mut extraction = Extraction::default();
            for (path, result) in paths.iter().zip(results) {
                match result {
                    Ok(record) => extraction.records.push(record),
                    Err(e) => {
                        warn!(path = %path.display(), kind = %e.kind(), error = %e, "skipping snapshot");
                        extraction.failures.push(FileFailure {
                            path: path.clone(),
                            kind: e.kind(),
                            message: e.to_string(),
                        });
                    }
                }
            }
            extraction
        }
    };

    info!(
        records = extraction.records.len(),
        skipped = extraction.failures.len(),
        elapsed = ?start.elapsed(),
        "extraction finished"
    );
    Ok(extraction)
}
