//! Output path resolution and atomic writes

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use lopdf::Document;
use tempfile::NamedTempFile;
use crate::error::{Error, Result};

/// Suffix inserted before the extension when deriving an output name
pub const SIGNED_SUFFIX: &str = "_signed";

/// Decide where the signed PDF goes
///
/// An explicit `output` always wins. Otherwise, with `rename` set, the output
/// sits next to the source as `<stem>_signed<.ext>`.
pub fn resolve_output_path(source: &Path, output: Option<&Path>, rename: bool) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.to_path_buf());
    }
    if rename {
        return Ok(signed_file_name(source));
    }
    Err(Error::MissingOutput)
}

/// `dir/contract.pdf` → `dir/contract_signed.pdf`
pub fn signed_file_name(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match source.extension() {
        Some(ext) => format!("{}{}.{}", stem, SIGNED_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, SIGNED_SUFFIX),
    };
    source.with_file_name(file_name)
}

/// Compress and save `doc` to `path` without ever leaving a partial file there
///
/// The document is written to a temporary file in the destination directory
/// and renamed over `path` once complete. On failure the temporary file is
/// removed when it is dropped.
pub fn write_atomically(mut doc: Document, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let write_err = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let temp = NamedTempFile::new_in(&dir).map_err(write_err)?;

    doc.compress();
    {
        let mut writer = BufWriter::new(temp.as_file());
        doc.save_to(&mut writer)
            .map_err(|e| write_err(std::io::Error::other(e)))?;
        writer.flush().map_err(write_err)?;
    }
    temp.as_file().sync_all().map_err(write_err)?;

    if let Some(permissions) = output_permissions(path) {
        temp.as_file().set_permissions(permissions).map_err(write_err)?;
    }

    temp.persist(path).map_err(|e| write_err(e.error))?;
    log::debug!("Persisted {}", path.display());

    Ok(())
}

/// Permissions for the finished file
///
/// An existing destination keeps its mode. A new file gets 0644 on Unix
/// instead of the owner-only mode temp files are created with.
fn output_permissions(path: &Path) -> Option<std::fs::Permissions> {
    if let Ok(metadata) = std::fs::metadata(path) {
        return Some(metadata.permissions());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(std::fs::Permissions::from_mode(0o644))
    }

    #[cfg(not(unix))]
    {
        None
    }
}
