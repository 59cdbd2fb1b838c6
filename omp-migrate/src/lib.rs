//! OMP Migrate Library
//!
//! Glue around `omp-snapshot`: command line, connection profile, the `omp`
//! client transport and the compressed archive format.

pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod omp;
pub mod utils;

// Re-export commonly used types
pub use config::ConnectionProfile;
pub use utils::errors::MigrateError;
pub type Result<T> = std::result::Result<T, MigrateError>;
