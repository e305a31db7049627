//! Size-based rotation and age-based retention.
//!
//! Rotation renames the live file to a timestamp-suffixed segment, gzip
//! compresses it with bounded memory (streamed in chunks), and removes the
//! uncompressed original.  The next append recreates the live file.
//!
//! Retention runs opportunistically on every rotation check — no
//! background scheduler — and deletes anything in the log directory older
//! than the configured window.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{info, warn};

use charttrail_contracts::{TrailError, TrailResult};

use crate::config::TrailConfig;

/// Rotate `path` if it has reached the configured size threshold.
///
/// Called by the writer with the category lock already held, so rotation
/// never races an in-progress append to the same file.  A missing file
/// (nothing written yet today) is not an error.
pub fn rotate_if_needed(path: &Path, config: &TrailConfig) -> TrailResult<()> {
    let size = match fs::metadata(path) {
        Ok(m) => m.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(TrailError::RotationFailed {
                reason: format!("failed to stat '{}': {}", path.display(), e),
            })
        }
    };

    if size < config.max_file_size_bytes {
        return Ok(());
    }

    let rotated = segment_name(path);
    fs::rename(path, &rotated).map_err(|e| TrailError::RotationFailed {
        reason: format!(
            "failed to rename '{}' to '{}': {}",
            path.display(),
            rotated.display(),
            e
        ),
    })?;

    let compressed = compress(&rotated)?;

    fs::remove_file(&rotated).map_err(|e| TrailError::RotationFailed {
        reason: format!(
            "failed to remove uncompressed segment '{}': {}",
            rotated.display(),
            e
        ),
    })?;

    info!(
        segment = %compressed.display(),
        size_bytes = size,
        "log segment rotated"
    );
    Ok(())
}

/// Delete everything in `dir` whose modification time is older than the
/// retention window.  Returns the number of files removed.
///
/// Applies to rotated and live files alike; tip sidecars touched by any
/// recent write are never old enough to qualify.
pub fn cleanup(dir: &Path, config: &TrailConfig) -> TrailResult<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(TrailError::RotationFailed {
                reason: format!("failed to scan '{}': {}", dir.display(), e),
            })
        }
    };

    let retention_secs = config.retention_secs();
    let mut removed = 0usize;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let Ok(age) = modified.elapsed() else {
            continue; // clock skew: mtime in the future
        };
        if age.as_secs() <= retention_secs {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(segment = %path.display(), age_secs = age.as_secs(), "expired segment removed");
                removed += 1;
            }
            Err(e) => {
                warn!(segment = %path.display(), error = %e, "failed to remove expired segment");
            }
        }
    }

    Ok(removed)
}

/// Timestamp-suffixed segment name for a rotating file, e.g.
/// `access_2026-08-24.log.20260824T153000`.  A numeric suffix breaks ties
/// when two rotations land in the same second.
fn segment_name(path: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S");
    let base = format!("{}.{}", path.display(), stamp);
    let mut candidate = PathBuf::from(&base);
    let mut n = 1;
    while candidate.exists() || PathBuf::from(format!("{}.gz", candidate.display())).exists() {
        candidate = PathBuf::from(format!("{}-{}", base, n));
        n += 1;
    }
    candidate
}

/// Stream-compress `src` into `src.gz` in 8 KiB chunks.
fn compress(src: &Path) -> TrailResult<PathBuf> {
    let target = PathBuf::from(format!("{}.gz", src.display()));

    let input = File::open(src).map_err(|e| TrailError::RotationFailed {
        reason: format!("failed to open segment '{}': {}", src.display(), e),
    })?;
    let output = File::create(&target).map_err(|e| TrailError::RotationFailed {
        reason: format!("failed to create '{}': {}", target.display(), e),
    })?;

    let mut reader = BufReader::with_capacity(8 * 1024, input);
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    io::copy(&mut reader, &mut encoder).map_err(|e| TrailError::RotationFailed {
        reason: format!("failed to compress '{}': {}", src.display(), e),
    })?;
    encoder
        .finish()
        .map_err(|e| TrailError::RotationFailed {
            reason: format!("failed to finish '{}': {}", target.display(), e),
        })?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::{Duration, SystemTime};

    use tempfile::TempDir;

    use super::*;

    fn small_config(dir: &Path) -> TrailConfig {
        TrailConfig {
            log_dir: dir.to_path_buf(),
            max_file_size_bytes: 100,
            ..TrailConfig::default()
        }
    }

    #[test]
    fn below_threshold_is_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access_2026-08-24.log");
        fs::write(&path, "short\n").unwrap();

        rotate_if_needed(&path, &small_config(dir.path())).unwrap();
        assert!(path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access_2026-08-24.log");
        rotate_if_needed(&path, &small_config(dir.path())).unwrap();
    }

    #[test]
    fn over_threshold_rotates_and_compresses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access_2026-08-24.log");
        fs::write(&path, "x".repeat(200)).unwrap();

        rotate_if_needed(&path, &small_config(dir.path())).unwrap();

        // Live file gone; next write starts it fresh.
        assert!(!path.exists());

        // Exactly one compressed segment, with the gzip magic bytes, and
        // no uncompressed leftover.
        let files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .collect();
        assert_eq!(files.len(), 1);
        let segment = &files[0];
        let name = segment.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("access_2026-08-24.log."));
        assert!(name.ends_with(".gz"));
        let bytes = fs::read(segment).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn cleanup_removes_only_expired_files() {
        let dir = TempDir::new().unwrap();
        let fresh = dir.path().join("access_2026-08-24.log");
        fs::write(&fresh, "fresh\n").unwrap();

        // Zero-day retention expires everything with a positive age; the
        // just-written file has age ~0 and survives.
        let config = TrailConfig {
            log_dir: dir.path().to_path_buf(),
            retention_days: 0,
            ..TrailConfig::default()
        };
        let removed = cleanup(dir.path(), &config).unwrap();
        assert_eq!(removed, 0);
        assert!(fresh.exists());

        // A generous window keeps everything.
        let keep_all = TrailConfig {
            retention_days: 3650,
            ..config
        };
        assert_eq!(cleanup(dir.path(), &keep_all).unwrap(), 0);
    }

    #[test]
    fn cleanup_deletes_backdated_segments() {
        let dir = TempDir::new().unwrap();
        let fresh = dir.path().join("access_2026-08-25.log");
        fs::write(&fresh, "fresh\n").unwrap();

        // A rotated segment whose mtime is 40 days back, against a 30-day
        // window.
        let expired = dir.path().join("access_2026-07-01.log.20260701T000000.gz");
        fs::write(&expired, "old\n").unwrap();
        let backdated = SystemTime::now() - Duration::from_secs(40 * 24 * 60 * 60);
        File::options()
            .write(true)
            .open(&expired)
            .unwrap()
            .set_modified(backdated)
            .unwrap();

        let config = TrailConfig {
            log_dir: dir.path().to_path_buf(),
            retention_days: 30,
            ..TrailConfig::default()
        };
        assert_eq!(cleanup(dir.path(), &config).unwrap(), 1);
        assert!(!expired.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn cleanup_of_missing_dir_is_zero() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("nope");
        assert_eq!(cleanup(&gone, &TrailConfig::default()).unwrap(), 0);
    }
}
