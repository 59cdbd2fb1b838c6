//! Snapshot reader.
//!
//! Opening a snapshot validates all manifests up front: a missing or
//! malformed snapshot is rejected before anything is sent to the
//! destination.

use super::{document_file, manifest_file, ManifestEntry};
use crate::document::Document;
use crate::kind::{EntityKind, EntityRef};
use crate::utils::errors::{Result, SnapshotError};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct SnapshotReader {
    dir: PathBuf,
    manifests: HashMap<EntityKind, Vec<ManifestEntry>>,
}

impl SnapshotReader {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(SnapshotError::SnapshotNotFound(dir));
        }

        let mut manifests = HashMap::new();
        for kind in EntityKind::ALL {
            let path = dir.join(manifest_file(kind));
            if !path.exists() {
                continue;
            }
            let entries = read_manifest(&path, kind)?;
            for entry in &entries {
                let document = dir.join(document_file(entry.reference()));
                if kind != EntityKind::Credential && !document.is_file() {
                    return Err(SnapshotError::MissingDocument(entry.reference().to_string()));
                }
            }
            manifests.insert(kind, entries);
        }

        if manifests.is_empty() {
            return Err(SnapshotError::SnapshotNotFound(dir));
        }
        Ok(Self { dir, manifests })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Manifest entries of `kind` in replay order.
    pub fn entries(&self, kind: EntityKind) -> &[ManifestEntry] {
        self.manifests.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Stored creation document, or `None` for records that have none.
    pub fn document(&self, reference: EntityRef) -> Result<Option<Document>> {
        let path = self.dir.join(document_file(reference));
        if !path.exists() {
            return Ok(None);
        }
        let stored = fs::read_to_string(&path).map_err(|e| SnapshotError::io(&path, e))?;
        Ok(Some(Document::parse_stored(&stored, reference.kind)))
    }
}

fn read_manifest(path: &Path, kind: EntityKind) -> Result<Vec<ManifestEntry>> {
    let content = fs::read_to_string(path).map_err(|e| SnapshotError::io(path, e))?;
    let mut entries = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let malformed = |reason: String| SnapshotError::Manifest {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };

        let entry = ManifestEntry::parse(line).map_err(malformed)?;
        if entry.kind != kind {
            return Err(malformed(format!("{} entry in {} manifest", entry.kind, kind)));
        }
        let expected = entries.len() as u32 + 1;
        if entry.ordinal != expected {
            return Err(malformed(format!(
                "ordinal {} out of sequence, expected {expected}",
                entry.ordinal
            )));
        }
        entries.push(entry);
    }

    Ok(entries)
}
