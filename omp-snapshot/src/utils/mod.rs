//! Utility modules for snapshot handling.

pub mod errors;

pub use errors::{Result, SnapshotError};
