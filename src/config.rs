// src/config.rs

use std::time::Duration;

/// What to do when a single snapshot fails to parse or normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole run on the first failing file.
    #[default]
    FailFast,
    /// Leave failing files out of the dataset and list them in the run report.
    SkipAndReport,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Worker pool size. `None` means available CPUs minus one.
    pub workers: Option<usize>,
    /// Upper bound on wall time spent on a single snapshot.
    pub task_timeout: Option<Duration>,
    /// Snapshot file extension, without the dot.
    pub extension: String,
    pub failure_policy: FailurePolicy,
    /// Fail the record when an optional field is present but malformed.
    pub strict_optional: bool,
    pub dataset_file_name: String,
    pub report_file_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: None,
            task_timeout: None,
            extension: "snapshot".to_string(),
            failure_policy: FailurePolicy::FailFast,
            strict_optional: false,
            dataset_file_name: "all_incidents.parquet".to_string(),
            report_file_name: "all_incidents.report.json".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Worker count actually used; never below 1.
    pub fn effective_workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| num_cpus::get().saturating_sub(1))
            .max(1)
    }
}
