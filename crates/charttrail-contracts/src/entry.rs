//! The physical log record and its enums.
//!
//! One `LogEntry` becomes one JSONL line on disk.  The `prev_hash` and
//! `hash` fields are derived inside the log writer's locked region — any
//! value a caller puts there is overwritten before persistence.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrailError;
use crate::value::CtxValue;

/// Hard upper bound on a raw message before validation rejects it outright.
///
/// Messages under this bound are still truncated to the configured soft cap
/// by the redactor; this constant only guards against pathological input.
pub const MAX_RAW_MESSAGE: usize = 64 * 1024;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    /// Business-operation audit records. Always retained, never sampled.
    Audit,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::Audit => "audit",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The partition a log entry is written to.
///
/// Each category gets its own per-date file and its own hash chain, so
/// writes to different categories never contend on a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Auth,
    Access,
    Form,
    Error,
    System,
    Osha,
    Hipaa,
    Encounter,
    Vitals,
    Assessment,
    Treatment,
    Signature,
    Finalization,
    PhiAccess,
}

impl LogCategory {
    /// The token used in file names and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Auth => "auth",
            LogCategory::Access => "access",
            LogCategory::Form => "form",
            LogCategory::Error => "error",
            LogCategory::System => "system",
            LogCategory::Osha => "osha",
            LogCategory::Hipaa => "hipaa",
            LogCategory::Encounter => "encounter",
            LogCategory::Vitals => "vitals",
            LogCategory::Assessment => "assessment",
            LogCategory::Treatment => "treatment",
            LogCategory::Signature => "signature",
            LogCategory::Finalization => "finalization",
            LogCategory::PhiAccess => "phi_access",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogCategory {
    type Err = TrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(LogCategory::Auth),
            "access" => Ok(LogCategory::Access),
            "form" => Ok(LogCategory::Form),
            "error" => Ok(LogCategory::Error),
            "system" => Ok(LogCategory::System),
            "osha" => Ok(LogCategory::Osha),
            "hipaa" => Ok(LogCategory::Hipaa),
            "encounter" => Ok(LogCategory::Encounter),
            "vitals" => Ok(LogCategory::Vitals),
            "assessment" => Ok(LogCategory::Assessment),
            "treatment" => Ok(LogCategory::Treatment),
            "signature" => Ok(LogCategory::Signature),
            "finalization" => Ok(LogCategory::Finalization),
            "phi_access" => Ok(LogCategory::PhiAccess),
            other => Err(TrailError::InvalidEntry {
                reason: format!("unknown log category '{}'", other),
            }),
        }
    }
}

/// Who performed the action, and from where.
///
/// Captured centrally by the event builder so callers cannot forget it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One physical log record — one line on disk.
///
/// `prev_hash` links this entry to the previous one in its category's
/// chain; `hash` commits to every other field plus `prev_hash`'s value as
/// the running tip.  Modifying any persisted byte invalidates `hash` and
/// every subsequent `prev_hash`, which the verifier detects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock time (UTC, sub-second precision) the entry was created.
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub category: LogCategory,
    /// Sanitized, length-capped message.
    pub message: String,
    /// Recursively sanitized context values.
    pub context: BTreeMap<String, CtxValue>,
    pub actor: ActorContext,
    pub request_id: Option<String>,
    pub process_id: u32,
    /// Hex hash of the previous entry in this category's chain.
    ///
    /// Derived at write time; caller-supplied values are overwritten.
    pub prev_hash: String,
    /// Hex SHA-256 of this entry's canonical content plus `prev_hash`.
    ///
    /// Derived at write time; caller-supplied values are overwritten.
    pub hash: String,
}

impl LogEntry {
    /// Build a transient entry ready for the writer.
    ///
    /// Hash fields start empty — the writer fills them inside its locked
    /// region, where the chain tip is known.
    pub fn new(
        level: LogLevel,
        category: LogCategory,
        message: impl Into<String>,
        context: BTreeMap<String, CtxValue>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            category,
            message: message.into(),
            context,
            actor: ActorContext::default(),
            request_id: None,
            process_id: std::process::id(),
            prev_hash: String::new(),
            hash: String::new(),
        }
    }

    /// Attach actor context.
    pub fn with_actor(mut self, actor: ActorContext) -> Self {
        self.actor = actor;
        self
    }

    /// Attach a request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}
