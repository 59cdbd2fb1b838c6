//! Snapshot writer.

use super::{document_file, manifest_file, ManifestEntry};
use crate::decode::Record;
use crate::kind::{EntityKind, EntityRef};
use crate::utils::errors::{Result, SnapshotError};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    /// Write into `dir`, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SnapshotError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Start an empty manifest for `kind` so readers can tell "no entities"
    /// from "not exported".
    pub fn begin_kind(&mut self, kind: EntityKind) -> Result<()> {
        let path = self.dir.join(manifest_file(kind));
        fs::write(&path, "").map_err(|e| SnapshotError::io(&path, e))
    }

    /// Append the record's manifest line and store its creation document.
    pub fn write(&mut self, record: &Record) -> Result<()> {
        let reference = EntityRef::new(record.kind, record.ordinal);
        let entry = ManifestEntry::new(record.kind, record.ordinal, record.name.clone());

        match (record.kind, record.document()) {
            (_, Some(document)) => {
                let path = self.dir.join(document_file(reference));
                fs::write(&path, format!("{}\n", document.to_stored()))
                    .map_err(|e| SnapshotError::io(&path, e))?;
            }
            (EntityKind::Credential, None) => {}
            (_, None) => return Err(SnapshotError::MissingDocument(reference.to_string())),
        }

        let path = self.dir.join(manifest_file(record.kind));
        let mut manifest = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SnapshotError::io(&path, e))?;
        writeln!(manifest, "{}", entry.to_line()).map_err(|e| SnapshotError::io(&path, e))?;

        debug!(record = %reference, name = %record.name, "Wrote snapshot record");
        Ok(())
    }
}
