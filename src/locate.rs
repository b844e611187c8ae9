// src/locate.rs

use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::error::{PipelineError, Result};

/// Find every `*.<extension>` file under `root`, sorted lexicographically.
///
/// A missing root is an error; a root without snapshots yields an empty list.
#[instrument(level = "info", skip(root), fields(root = %root.as_ref().display()))]
pub fn locate_snapshots<P: AsRef<Path>>(root: P, extension: &str) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(PipelineError::NotFound(root.to_path_buf()));
    }

    let pattern = format!("{}/**/*", glob::Pattern::escape(&root.to_string_lossy()));
    let entries = glob(&pattern).map_err(|e| PipelineError::Parse(format!("glob pattern: {e}")))?;

    let wanted = extension.trim_start_matches('.');
    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => {
                let matches = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(wanted));
                if matches && path.is_file() {
                    debug!(path = %path.display(), "found snapshot");
                    paths.push(path);
                }
            }
            Err(e) => {
                return Err(PipelineError::io(e.path().to_path_buf(), e.into_error()));
            }
        }
    }

    paths.sort();
    if paths.is_empty() {
        warn!("no snapshot files found");
    } else {
        info!(count = paths.len(), "located snapshots");
    }
    Ok(paths)
}
