//! Custom error types for the migration tool.

use omp_snapshot::SnapshotError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive error at {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl From<::config::ConfigError> for MigrateError {
    fn from(error: ::config::ConfigError) -> Self {
        MigrateError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
