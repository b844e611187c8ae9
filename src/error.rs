// src/error.rs

use serde::Serialize;
use std::{fmt, path::PathBuf, time::Duration};
use thiserror::Error;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Coarse classification used for reporting and exit handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Parse,
    FieldFormat,
    Io,
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Parse => "parse",
            ErrorKind::FieldFormat => "field_format",
            ErrorKind::Io => "io",
            ErrorKind::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("snapshot structure: {0}")]
    Parse(String),

    #[error("field `{field}` has unexpected format ({reason}): {value:?}")]
    FieldFormat {
        field: String,
        value: String,
        reason: String,
    },

    #[error("I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset file {}: {message}", path.display())]
    Output { path: PathBuf, message: String },

    #[error("task exceeded timeout of {0:?}")]
    Timeout(Duration),

    #[error("{}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn field(field: &str, value: &str, reason: impl Into<String>) -> Self {
        PipelineError::FieldFormat {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn output(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        PipelineError::Output {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Attach the snapshot path a per-file failure came from.
    pub fn in_snapshot(self, path: impl Into<PathBuf>) -> Self {
        match self {
            already @ PipelineError::Snapshot { .. } => already,
            other => PipelineError::Snapshot {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NotFound(_) => ErrorKind::NotFound,
            PipelineError::Parse(_) => ErrorKind::Parse,
            PipelineError::FieldFormat { .. } => ErrorKind::FieldFormat,
            PipelineError::Io { .. } | PipelineError::Output { .. } => ErrorKind::Io,
            PipelineError::Timeout(_) => ErrorKind::Timeout,
            PipelineError::Snapshot { source, .. } => source.kind(),
        }
    }

    /// Offending path, if the error carries one.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            PipelineError::NotFound(p) => Some(p),
            PipelineError::Io { path, .. }
            | PipelineError::Output { path, .. }
            | PipelineError::Snapshot { path, .. } => Some(path),
            _ => None,
        }
    }
}
