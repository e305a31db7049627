//! # charttrail-verify
//!
//! Offline/on-demand integrity verification for CHARTTRAIL log segments.
//!
//! Replays a segment line by line, recomputing the hash chain to confirm
//! no entry was altered, inserted, or removed.  Works against live files
//! and rotated gzip segments alike, and never writes anything.

pub mod engine;

pub use engine::{segment_path, verify, verify_segment, Outcome};
