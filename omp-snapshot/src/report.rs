//! Outcome of one export or restore run.
//!
//! Warnings and errors are logged as they happen and also collected here so
//! the caller can show them once, together, at the end of the run.

use crate::kind::EntityKind;
use std::fmt::Write;
use tracing::{error, warn};

#[derive(Debug, Default)]
pub struct RunReport {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Entities written to the snapshot.
    pub exported: usize,
    /// Entities created on the destination.
    pub created: usize,
    /// Entities that already existed on the destination.
    pub skipped: usize,
    /// Kind whose failures stopped the restore.
    pub aborted_at: Option<EntityKind>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.errors.push(message);
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.aborted_at.is_none()
    }

    /// Final warnings/errors block; empty when there is nothing to report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.warnings.is_empty() {
            out.push_str("Warnings:\n");
            for warning in &self.warnings {
                let _ = writeln!(out, "  - {warning}");
            }
        }
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for error in &self.errors {
                let _ = writeln!(out, "  - {error}");
            }
        }
        if let Some(kind) = self.aborted_at {
            let _ = writeln!(
                out,
                "Import stopped after {}; later kinds were not processed.",
                kind.label()
            );
        }
        out
    }
}
