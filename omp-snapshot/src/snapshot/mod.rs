//! On-disk snapshot layout.
//!
//! A snapshot directory holds one manifest per kind (`{prefix}.list`, one
//! `{prefix}_{ordinal}@{name}` line per record) and one creation document
//! per record (`{prefix}_{ordinal}.xml`, a single line).

pub mod manifest;
pub mod reader;
pub mod writer;

pub use manifest::ManifestEntry;
pub use reader::SnapshotReader;
pub use writer::SnapshotWriter;

use crate::kind::{EntityKind, EntityRef};

pub fn manifest_file(kind: EntityKind) -> String {
    format!("{}.list", kind.prefix())
}

pub fn document_file(reference: EntityRef) -> String {
    format!("{reference}.xml")
}
