//! Snapshot archive: the snapshot directory as a zstd-compressed tar stream.
//!
//! A path of `-` means stdout when packing and stdin when unpacking.

use crate::utils::errors::{MigrateError, Result};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compression level of the zstd layer.
pub const COMPRESSION_LEVEL: i32 = 3;

/// Path placeholder for the standard streams.
pub const STDIO: &str = "-";

fn archive_error(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> MigrateError {
    let path = path.into();
    move |source| MigrateError::Archive { path, source }
}

/// Pack the files of `dir` into `target`.
pub fn pack(dir: &Path, target: &str) -> Result<()> {
    if target == STDIO {
        let stdout = io::stdout().lock();
        pack_into(dir, stdout)?.flush().map_err(archive_error(STDIO))?;
    } else {
        let file = File::create(target).map_err(archive_error(target))?;
        pack_into(dir, file)?.sync_all().map_err(archive_error(target))?;
    }
    debug!(target = %target, "Packed snapshot");
    Ok(())
}

/// Write the files of `dir`, sorted by name, as a compressed tar stream.
pub fn pack_into<W: Write>(dir: &Path, writer: W) -> Result<W> {
    let encoder = zstd::Encoder::new(writer, COMPRESSION_LEVEL).map_err(archive_error(dir))?;
    let mut builder = tar::Builder::new(encoder);

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(archive_error(dir))? {
        let entry = entry.map_err(archive_error(dir))?;
        if entry.file_type().map_err(archive_error(entry.path()))?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    for path in &files {
        let Some(name) = path.file_name() else {
            continue;
        };
        builder
            .append_path_with_name(path, name)
            .map_err(archive_error(path))?;
    }

    let encoder = builder.into_inner().map_err(archive_error(dir))?;
    encoder.finish().map_err(archive_error(dir))
}

/// Unpack `source` into `dir`.
pub fn unpack(source: &str, dir: &Path) -> Result<()> {
    if source == STDIO {
        unpack_from(io::stdin().lock(), dir)?;
    } else {
        let file = File::open(source).map_err(archive_error(source))?;
        unpack_from(file, dir)?;
    }
    debug!(source = %source, "Unpacked snapshot");
    Ok(())
}

pub fn unpack_from<R: Read>(reader: R, dir: &Path) -> Result<()> {
    let decoder = zstd::Decoder::new(reader).map_err(archive_error(dir))?;
    let mut archive = tar::Archive::new(decoder);
    archive.unpack(dir).map_err(archive_error(dir))
}
