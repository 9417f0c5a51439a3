//! Filesystem helpers.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Unique sibling temp path for `path`, distinct per call within a process.
fn temp_path_for(path: &Path, parent: &Path) -> PathBuf {
    parent.join(format!(
        ".{}.tmp.{}.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("euk"),
        std::process::id(),
        TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
    ))
}

fn write_temp(temp_path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(temp_path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Write bytes atomically using temp file + rename.
///
/// The temp file lives next to the target so the rename stays on one
/// filesystem. It is removed on any failure after creation.
pub fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
    }
    let temp_path = temp_path_for(path, parent);

    let result = write_temp(&temp_path, content).and_then(|()| std::fs::rename(&temp_path, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}
