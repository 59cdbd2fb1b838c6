//! Export and import runs between a protocol service and an archive.

use crate::archive;
use anyhow::{Context, Result};
use omp_snapshot::{
    export_snapshot, ExportOptions, ProtocolService, RestoreEngine, RunReport, SnapshotReader,
    SnapshotWriter,
};
use tempfile::TempDir;
use tracing::info;

/// Capture the service's configuration and pack it into `file`.
pub fn export<S: ProtocolService>(
    service: S,
    file: &str,
    slave_password: Option<String>,
) -> Result<RunReport> {
    let staging = TempDir::new().context("Failed to create staging directory")?;
    let mut writer = SnapshotWriter::create(staging.path())?;

    let options = ExportOptions {
        slave_password,
        ..ExportOptions::default()
    };
    let report = export_snapshot(service, &mut writer, options).context("Export failed")?;

    archive::pack(staging.path(), file)
        .with_context(|| format!("Failed to write snapshot {file}"))?;
    info!("Exported {} entities to {}", report.exported, file);
    Ok(report)
}

/// Unpack `file` and replay it onto the service.
pub fn import<S: ProtocolService>(service: S, file: &str) -> Result<RunReport> {
    let staging = TempDir::new().context("Failed to create staging directory")?;
    archive::unpack(file, staging.path())
        .with_context(|| format!("Failed to read snapshot {file}"))?;

    let snapshot = SnapshotReader::open(staging.path()).context("Invalid snapshot")?;
    let report = RestoreEngine::new(service).run(&snapshot).context("Import failed")?;

    info!(
        "Imported {} entities, {} already present",
        report.created, report.skipped
    );
    Ok(report)
}
