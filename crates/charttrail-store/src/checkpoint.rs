//! The tip-hash checkpoint sidecar.
//!
//! One small file per category holding the current chain tip as a single
//! hex line.  The writer re-reads it at the start of every locked write
//! (the on-disk value is the source of truth when multiple processes share
//! a category) and atomically replaces it after every successful append.
//!
//! The checkpoint is a bootstrap/performance aid only — the verifier
//! trusts the hashes embedded in the log files, never this file.

use std::fs;
use std::path::{Path, PathBuf};

use charttrail_contracts::{LogCategory, TrailError, TrailResult};

/// Path of the tip sidecar for `category` inside `dir`.
pub fn tip_path(dir: &Path, category: LogCategory) -> PathBuf {
    dir.join(format!("{}.tip", category.as_str()))
}

/// Load the checkpointed tip, if one exists.
///
/// A missing file is `Ok(None)` (first write for this category); an empty
/// file is treated the same way.
pub fn load(path: &Path) -> TrailResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let tip = contents.trim();
            if tip.is_empty() {
                Ok(None)
            } else {
                Ok(Some(tip.to_string()))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TrailError::WriteFailed {
            reason: format!("failed to read checkpoint '{}': {}", path.display(), e),
        }),
    }
}

/// Atomically replace the checkpoint with `tip`.
///
/// Written to a temp file in the same directory and renamed into place, so
/// a crash never leaves a half-written checkpoint.
pub fn store(path: &Path, tip: &str) -> TrailResult<()> {
    let tmp = path.with_extension("tip.tmp");
    fs::write(&tmp, format!("{}\n", tip)).map_err(|e| TrailError::WriteFailed {
        reason: format!("failed to write checkpoint temp '{}': {}", tmp.display(), e),
    })?;
    fs::rename(&tmp, path).map_err(|e| TrailError::WriteFailed {
        reason: format!("failed to replace checkpoint '{}': {}", path.display(), e),
    })
}
