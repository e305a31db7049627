//! Audit event types — the business-operation specialization of `LogEntry`.
//!
//! An `AuditEvent` is produced by the event builder in `charttrail-events`
//! and flattened into a `LogEntry`'s context for persistence.  Only data
//! definitions live here.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::CtxValue;

/// The business operation an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Read,
    Update,
    Delete,
    Search,
    Export,
    Print,
    AccessDenied,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Read => "read",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Search => "search",
            AuditAction::Export => "export",
            AuditAction::Print => "print",
            AuditAction::AccessDenied => "access_denied",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized business-operation audit record.
///
/// For `Update` events, `old_values`/`new_values` are filtered down to
/// exactly the keys in `modified_fields` before storage — unchanged fields
/// are never persisted.  Both maps have already passed through the
/// redactor by the time an event leaves the builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    /// Sanitized pre-change values, present only for the modified fields.
    pub old_values: Option<BTreeMap<String, CtxValue>>,
    /// Sanitized post-change values, present only for the modified fields.
    pub new_values: Option<BTreeMap<String, CtxValue>>,
    /// Ordered (sorted) list of fields that changed.
    pub modified_fields: Vec<String>,
    /// Set when the operation touched a patient record (PHI-access tracking).
    pub patient_id: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub description: String,
}
