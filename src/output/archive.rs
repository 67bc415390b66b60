//! Writes an exported trace archive out as a directory tree.

use super::json::create_parent_dirs;
use crate::registry::TraceArchive;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::path::{Component, Path, PathBuf};

/// Write every archive entry below `root`
///
/// # Returns
/// Paths of the files written, in archive order
///
/// # Errors
/// * `OutputError::InvalidPath` - If `root` is a file or an entry escapes `root`
/// * `OutputError::WriteFailed` - I/O error during write
pub fn write_archive(archive: &TraceArchive, root: impl AsRef<Path>) -> Result<Vec<PathBuf>, OutputError> {
    let root = root.as_ref();
    info!(
        "Exporting {} file(s) ({} bytes) to {}",
        archive.entries.len(),
        archive.total_size(),
        root.display()
    );

    if root.is_file() {
        return Err(OutputError::InvalidPath(format!(
            "Export target is a file: {}",
            root.display()
        )));
    }

    let mut written = Vec::with_capacity(archive.entries.len());
    for entry in &archive.entries {
        let relative = Path::new(&entry.path);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(OutputError::InvalidPath(format!("Unsafe archive path: {}", entry.path)));
        }

        let path = root.join(relative);
        create_parent_dirs(&path)?;
        std::fs::write(&path, &entry.data)?;
        debug!("Wrote {} ({} bytes)", path.display(), entry.data.len());
        written.push(path);
    }

    Ok(written)
}
