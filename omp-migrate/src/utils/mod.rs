//! Utility modules for the migration tool.

pub mod errors;
pub mod logger;

pub use errors::{MigrateError, Result};
