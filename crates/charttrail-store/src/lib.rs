//! # charttrail-store
//!
//! Append-only, SHA-256 hash-chained log storage for CHARTTRAIL.
//!
//! ## Overview
//!
//! Entries are written one JSON object per line to per-category, per-date
//! files.  Each entry's hash commits to the previous tip, the tip is
//! checkpointed to a sidecar after every write, and segments rotate by
//! size (gzip) and expire by age.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use charttrail_store::{LogWriter, TrailConfig};
//!
//! let writer = LogWriter::new(TrailConfig::default())?;
//! let receipt = writer.write(entry)?;
//! assert_eq!(receipt.hash.len(), 64);
//! ```

pub mod chain;
pub mod checkpoint;
pub mod config;
pub mod rotation;
pub mod writer;

pub use chain::{bootstrap_seed, hash_entry};
pub use config::TrailConfig;
pub use writer::{LogWriter, WriteReceipt};
