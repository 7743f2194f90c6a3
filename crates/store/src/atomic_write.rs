//! Atomic file write using the write-rename pattern.
//!
//! The snapshot is written to `{path}.tmp`, flushed with `sync_all()`, then
//! renamed over the final path. A crash mid-write leaves the previous
//! snapshot intact.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Atomically replace the file at `path` with `data`. Parent directories are
/// created as needed.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}
