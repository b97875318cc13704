//! Error type shared by the reconciliation engine and its file collaborators.

use std::path::{Path, PathBuf};

/// Errors raised by the library. Binaries wrap these in `anyhow`.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("no team names found in any source")]
    NoUsableInput,

    #[error("no {side} team names found")]
    EmptySide { side: String },

    #[error("invalid threshold {name}={value}: {reason}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        reason: String,
    },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{path} is missing required columns: {expected}")]
    MissingColumns { path: PathBuf, expected: String },

    #[error("invalid date {value:?}: expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("backup target {0} already exists")]
    BackupExists(PathBuf),
}

impl ReconcileError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn csv(path: impl AsRef<Path>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
