//! Hash-chain primitives.
//!
//! Every persisted entry's hash commits to the previous tip, so a
//! retroactive edit to any line invalidates everything after it.
//!
//! Hash input layout (bytes, in order):
//!   1. canonical JSON of the entry with both hash fields excluded
//!      (struct field order is fixed; context is a `BTreeMap`, so keys are
//!      sorted — independent verifiers reproduce the same bytes)
//!   2. the previous tip hash as UTF-8 bytes

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use charttrail_contracts::{ActorContext, CtxValue, LogCategory, LogEntry, LogLevel};

/// The hashed view of an entry: every field except `prev_hash` and `hash`.
///
/// Listed explicitly so nothing is accidentally omitted and nothing
/// derived leaks in.
#[derive(Serialize)]
struct HashedFields<'a> {
    timestamp: &'a DateTime<Utc>,
    level: &'a LogLevel,
    category: &'a LogCategory,
    message: &'a str,
    context: &'a BTreeMap<String, CtxValue>,
    actor: &'a ActorContext,
    request_id: &'a Option<String>,
    process_id: u32,
}

/// Compute the SHA-256 hash for one log entry given the running tip.
///
/// The entry's own `prev_hash`/`hash` fields are ignored; only `prev_tip`
/// links the chain.  Returns a lowercase 64-character hex string.
///
/// # Panics
///
/// Panics if the entry cannot be serialized to JSON — which cannot happen
/// for the well-formed `LogEntry` type.
pub fn hash_entry(entry: &LogEntry, prev_tip: &str) -> String {
    let body = HashedFields {
        timestamp: &entry.timestamp,
        level: &entry.level,
        category: &entry.category,
        message: &entry.message,
        context: &entry.context,
        actor: &entry.actor,
        request_id: &entry.request_id,
        process_id: entry.process_id,
    };
    let body_json =
        serde_json::to_vec(&body).expect("LogEntry must always be serializable to JSON");

    let mut hasher = Sha256::new();
    hasher.update(&body_json);
    hasher.update(prev_tip.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive a fresh chain seed when a category has no checkpoint yet.
///
/// The seed is hashed from the current wall-clock nanoseconds and is not
/// independently reproducible — a trust-on-first-use bootstrap.  The
/// chain's guarantee is continuity after the first write, not a fixed
/// genesis, and every entry embeds its `prev_hash` so verification stays
/// self-contained.
pub fn bootstrap_seed() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(nanos.to_le_bytes());
    hex::encode(hasher.finalize())
}
