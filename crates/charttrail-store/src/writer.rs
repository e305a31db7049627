//! The log writer — the single serialization point for the hash chain.
//!
//! `write()` resolves the category/date file, runs the rotation and
//! retention checks, then performs the chained append under a per-category
//! lock with a bounded wait:
//!
//!   lock → re-read checkpoint tip → hash → append one JSONL line →
//!   flush → replace checkpoint → unlock
//!
//! The chain tip is never cached across writes: the checkpoint on disk is
//! re-read inside every locked region, so multiple processes appending to
//! the same category each continue from the other's last write.  Chain
//! order therefore equals write order.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;

use charttrail_contracts::{LogCategory, LogEntry, TrailError, TrailResult, MAX_RAW_MESSAGE};

use crate::{chain, checkpoint, config::TrailConfig, rotation};

/// Poll interval while waiting for a contended file lock.
const LOCK_POLL: Duration = Duration::from_millis(5);

/// What `write()` returns on success.
#[derive(Debug, Clone)]
pub struct WriteReceipt {
    /// The entry's hash — the chain's new tip for its category.
    pub hash: String,
    /// The live file the entry was appended to.
    pub path: PathBuf,
}

/// Appends hash-chained entries to category/date-partitioned JSONL files.
///
/// # Thread safety
///
/// One lock per category, held for the full read-tip/hash/append/flush/
/// checkpoint sequence.  The category is also the chain and checkpoint
/// granularity, so the lock map stays bounded by the category count no
/// matter how many dates a process lives across.  Writes to different
/// categories never contend.
pub struct LogWriter {
    config: TrailConfig,
    locks: Mutex<HashMap<LogCategory, Arc<Mutex<()>>>>,
}

impl LogWriter {
    /// Create a writer, ensuring the log directory exists.
    pub fn new(config: TrailConfig) -> TrailResult<Self> {
        std::fs::create_dir_all(&config.log_dir).map_err(|e| TrailError::WriteFailed {
            reason: format!(
                "failed to create log dir '{}': {}",
                config.log_dir.display(),
                e
            ),
        })?;
        Ok(Self {
            config,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    /// The live file for `category` on today's (UTC) date.
    pub fn live_path(&self, category: LogCategory) -> PathBuf {
        let date = Utc::now().format("%Y-%m-%d");
        self.config
            .log_dir
            .join(format!("{}_{}.log", category.as_str(), date))
    }

    /// Append one entry to its category chain.
    ///
    /// The entry's `prev_hash`/`hash` fields are overwritten here — callers
    /// cannot supply them.  On success the checkpoint sidecar holds the
    /// returned hash as the category's new tip.
    pub fn write(&self, mut entry: LogEntry) -> TrailResult<WriteReceipt> {
        if entry.message.len() > MAX_RAW_MESSAGE {
            return Err(TrailError::InvalidEntry {
                reason: format!(
                    "message of {} bytes exceeds the {} byte cap",
                    entry.message.len(),
                    MAX_RAW_MESSAGE
                ),
            });
        }

        let path = self.live_path(entry.category);
        let lock = self.category_lock(entry.category);
        let _guard = acquire_bounded(&lock, &path, self.config.lock_timeout_ms)?;

        // Rotation is a precondition of the append, and retention piggybacks
        // on the rotation check.  Both run under the same lock as the append
        // so neither ever races an in-progress write to this file.
        rotation::rotate_if_needed(&path, &self.config)?;
        if let Err(e) = rotation::cleanup(&self.config.log_dir, &self.config) {
            // Retention is housekeeping; a failure must not drop the entry.
            tracing::warn!(error = %e, "retention cleanup failed");
        }

        let tip_path = checkpoint::tip_path(&self.config.log_dir, entry.category);
        let tip = match checkpoint::load(&tip_path)? {
            Some(tip) => tip,
            None => chain::bootstrap_seed(),
        };

        entry.prev_hash = tip.clone();
        entry.hash = chain::hash_entry(&entry, &tip);

        let line = serde_json::to_string(&entry).map_err(|e| TrailError::WriteFailed {
            reason: format!("failed to serialize entry: {}", e),
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| TrailError::WriteFailed {
                reason: format!("failed to open '{}': {}", path.display(), e),
            })?;
        writeln!(file, "{}", line).map_err(|e| TrailError::WriteFailed {
            reason: format!("failed to append to '{}': {}", path.display(), e),
        })?;
        file.flush().map_err(|e| TrailError::WriteFailed {
            reason: format!("failed to flush '{}': {}", path.display(), e),
        })?;

        checkpoint::store(&tip_path, &entry.hash)?;

        debug!(
            category = %entry.category,
            hash = %entry.hash,
            file = %path.display(),
            "entry appended"
        );

        Ok(WriteReceipt {
            hash: entry.hash,
            path,
        })
    }

    /// The shared lock for `category`, created on first use.
    fn category_lock(&self, category: LogCategory) -> Arc<Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks
            .entry(category)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Acquire `lock` within `timeout_ms`, polling rather than blocking
/// indefinitely.  Timing out is a defined failure, never a hang.
fn acquire_bounded<'l>(
    lock: &'l Mutex<()>,
    path: &Path,
    timeout_ms: u64,
) -> TrailResult<MutexGuard<'l, ()>> {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        match lock.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                if Instant::now() >= deadline {
                    return Err(TrailError::LockTimeout {
                        path: path.display().to_string(),
                        waited_ms: timeout_ms,
                    });
                }
                std::thread::sleep(LOCK_POLL);
            }
        }
    }
}
