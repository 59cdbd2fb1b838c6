//! Error types for snapshot export and restore.

use crate::kind::EntityKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Protocol service error: {0}")]
    Service(String),

    #[error("Malformed response to {command}: {reason}")]
    MalformedResponse { command: String, reason: String },

    #[error("Malformed manifest line {line} in {path}: {reason}")]
    Manifest {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(PathBuf),

    #[error("Missing creation document for {0}")]
    MissingDocument(String),

    #[error("Unresolved reference {token} in {document}")]
    UnresolvedReference { token: String, document: String },

    #[error("Import of {kind} failed with {} error(s)", .failures.len())]
    ImportFailed {
        kind: EntityKind,
        failures: Vec<String>,
    },
}

impl SnapshotError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapshotError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
