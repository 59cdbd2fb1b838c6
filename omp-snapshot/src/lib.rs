//! OMP Snapshot Library
//!
//! Captures scan-manager configuration (credentials through overrides) into
//! a portable directory snapshot and replays it onto another server, with
//! cross-entity references kept as symbolic `{kind}_{ordinal}` tokens.

pub mod decode;
pub mod document;
pub mod export;
pub mod kind;
pub mod report;
pub mod resolver;
pub mod restore;
pub mod service;
pub mod snapshot;
pub mod stream;
pub mod utils;

// Re-export commonly used types
pub use export::{export_snapshot, ExportOptions};
pub use kind::{EntityKind, EntityRef};
pub use report::RunReport;
pub use restore::RestoreEngine;
pub use service::ProtocolService;
pub use snapshot::{SnapshotReader, SnapshotWriter};
pub use utils::errors::{Result, SnapshotError};
