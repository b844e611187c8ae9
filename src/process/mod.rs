// src/process/mod.rs
pub mod date_parser;
pub mod executor;
pub mod fields;
pub mod page;
pub mod raw_table;
pub mod record;
pub mod utils;

use serde::Serialize;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{info, instrument};

use crate::config::PipelineConfig;
use crate::dataset::{write::write_dataset, Dataset};
use crate::error::{PipelineError, Result};
use crate::locate::locate_snapshots;

pub use executor::{extract_all, extract_snapshot, Extraction, FileFailure};
pub use fields::normalize;
pub use page::parse_page;
pub use raw_table::RawPropertyTable;
pub use record::{FieldValue, IncidentRecord, ValueKind};

/// Summary of one pipeline run, written next to the dataset.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input_dir: PathBuf,
    pub dataset_path: PathBuf,
    pub files_found: usize,
    pub records_extracted: usize,
    pub duplicates_dropped: usize,
    pub rows_written: usize,
    pub columns: Vec<String>,
    pub elapsed_ms: u128,
    pub failures: Vec<FileFailure>,
}

/// Run the whole batch: locate → extract (parallel) → assemble/dedup → write.
///
/// Nothing is written unless every stage before the writer succeeded.
#[instrument(level = "info", skip_all, fields(input = %input_dir.as_ref().display(), output = %output_dir.as_ref().display()))]
pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    input_dir: P,
    output_dir: Q,
    config: &PipelineConfig,
) -> Result<RunReport> {
    let start = Instant::now();
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();

    // 1) discover
    let paths = locate_snapshots(input_dir, &config.extension)?;

    // 2) extract, join barrier inside
    let extraction = extract_all(&paths, config)?;
    let records_extracted = extraction.records.len();

    // 3) assemble + dedup
    let dataset = Dataset::assemble(extraction.records);
    info!(
        rows_before = records_extracted,
        rows_after = dataset.num_rows(),
        "dropped exact duplicates"
    );

    // 4) persist
    fs::create_dir_all(output_dir).map_err(|e| PipelineError::io(output_dir, e))?;
    let dataset_path = output_dir.join(&config.dataset_file_name);
    write_dataset(&dataset, &dataset_path)?;

    let report = RunReport {
        input_dir: input_dir.to_path_buf(),
        dataset_path,
        files_found: paths.len(),
        records_extracted,
        duplicates_dropped: records_extracted - dataset.num_rows(),
        rows_written: dataset.num_rows(),
        columns: dataset.column_names().map(str::to_string).collect(),
        elapsed_ms: start.elapsed().as_millis(),
        failures: extraction.failures,
    };
    write_report(&report, &output_dir.join(&config.report_file_name))?;

    info!(rows = report.rows_written, elapsed_ms = report.elapsed_ms, "pipeline finished");
    Ok(report)
}

/// Pretty JSON, written to a temp file and renamed over `path`.
fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let mut tmp = fs::File::create(&tmp_path).map_err(|e| PipelineError::io(&tmp_path, e))?;
    serde_json::to_writer_pretty(&mut tmp, report).map_err(|e| PipelineError::output(&tmp_path, e))?;
    tmp.write_all(b"\n").map_err(|e| PipelineError::io(&tmp_path, e))?;
    drop(tmp);
    fs::rename(&tmp_path, path).map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}
