//! # charttrail-contracts
//!
//! Shared types and error contracts for the CHARTTRAIL audit core.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod entry;
pub mod error;
pub mod event;
pub mod value;

pub use entry::{ActorContext, LogCategory, LogEntry, LogLevel, MAX_RAW_MESSAGE};
pub use error::{TrailError, TrailResult};
pub use event::{AuditAction, AuditEvent};
pub use value::CtxValue;
