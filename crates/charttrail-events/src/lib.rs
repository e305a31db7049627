//! # charttrail-events
//!
//! Audit event construction and the CHARTTRAIL ingress facade.
//!
//! `AuditTrail` is what the business layer holds: `audit()` for
//! business-operation events and `log()` for lower-level diagnostics.
//! Both are fire-and-forget — they return a plain `bool` and never raise,
//! because an audit subsystem that can abort the primary transaction
//! defeats its own purpose.  Failures are reported through `tracing` and
//! otherwise swallowed.

pub mod actor;
pub mod builder;
pub mod diff;

use std::collections::BTreeMap;

use tracing::warn;
use uuid::Uuid;

use charttrail_contracts::{
    AuditAction, AuditEvent, CtxValue, LogCategory, LogEntry, LogLevel, TrailResult,
    MAX_RAW_MESSAGE,
};
use charttrail_redact::Redactor;
use charttrail_store::{LogWriter, TrailConfig};

pub use actor::RequestContext;
pub use builder::AuditEventBuilder;

/// The ingress facade over the redaction pipeline and the log store.
pub struct AuditTrail {
    writer: LogWriter,
    redactor: Redactor,
}

impl AuditTrail {
    /// Build the facade from a store configuration.
    ///
    /// The redactor's caps come from the same config so message and
    /// context truncation are tuned in one place.
    pub fn new(config: TrailConfig) -> TrailResult<Self> {
        let redactor = Redactor::new(config.max_message_len, config.max_context_value_len);
        let writer = LogWriter::new(config)?;
        Ok(Self { writer, redactor })
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    /// Write a diagnostic record.  Returns false (and reports via
    /// `tracing`) instead of raising on any failure.
    pub fn log(
        &self,
        level: LogLevel,
        category: LogCategory,
        message: &str,
        context: BTreeMap<String, CtxValue>,
    ) -> bool {
        self.log_with_request(level, category, message, context, None)
    }

    /// Write a diagnostic record with actor context attached.
    pub fn log_with_request(
        &self,
        level: LogLevel,
        category: LogCategory,
        message: &str,
        context: BTreeMap<String, CtxValue>,
        request: Option<&RequestContext>,
    ) -> bool {
        if message.len() > MAX_RAW_MESSAGE {
            warn!(
                category = %category,
                bytes = message.len(),
                "log entry dropped: message exceeds hard cap"
            );
            return false;
        }

        let mut entry = LogEntry::new(
            level,
            category,
            self.redactor.sanitize_message(message),
            self.redactor.sanitize_context(&context),
        );
        entry = self.attach_request(entry, request);
        self.persist(entry)
    }

    /// Write a business-operation audit event.
    ///
    /// The fully assembled context runs through the redactor before
    /// persistence: resource labels, ids, and hand-built events arrive
    /// unscrubbed, and sanitize is idempotent so maps already redacted by
    /// `AuditEventBuilder::build` come through unchanged.
    pub fn audit(&self, event: AuditEvent, request: Option<&RequestContext>) -> bool {
        let category = category_for(&event);
        let message = self.redactor.sanitize_message(&event.description);

        let mut context = BTreeMap::new();
        context.insert("action".to_string(), CtxValue::from(event.action.as_str()));
        context.insert(
            "resource_type".to_string(),
            CtxValue::Str(event.resource_type),
        );
        context.insert("resource_id".to_string(), CtxValue::Str(event.resource_id));
        context.insert("success".to_string(), CtxValue::Bool(event.success));
        context.insert(
            "modified_fields".to_string(),
            CtxValue::Array(event.modified_fields.into_iter().map(CtxValue::Str).collect()),
        );
        if let Some(old_values) = event.old_values {
            context.insert("old_values".to_string(), CtxValue::Map(old_values));
        }
        if let Some(new_values) = event.new_values {
            context.insert("new_values".to_string(), CtxValue::Map(new_values));
        }
        if let Some(patient_id) = event.patient_id {
            context.insert("patient_id".to_string(), CtxValue::Str(patient_id));
        }
        if let Some(error_message) = event.error_message {
            context.insert("error_message".to_string(), CtxValue::Str(error_message));
        }

        let context = self.redactor.sanitize_context(&context);

        let mut entry = LogEntry::new(LogLevel::Audit, category, message, context);
        entry = self.attach_request(entry, request);
        self.persist(entry)
    }

    /// Convenience ingress matching the shape the business layer calls
    /// with: one operation, a description, and loose metadata.
    pub fn audit_operation(
        &self,
        action: AuditAction,
        resource_type: &str,
        resource_id: &str,
        description: &str,
        metadata: BTreeMap<String, CtxValue>,
    ) -> bool {
        let event = AuditEventBuilder::new(action, resource_type, resource_id)
            .new_values(metadata)
            .description(description)
            .build(&self.redactor);
        self.audit(event, None)
    }

    fn attach_request(&self, mut entry: LogEntry, request: Option<&RequestContext>) -> LogEntry {
        if let Some(request) = request {
            entry.actor = request.actor();
            entry.request_id = Some(
                request
                    .request_id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
            );
        }
        entry
    }

    /// The swallow-and-report boundary: every write error becomes `false`.
    fn persist(&self, entry: LogEntry) -> bool {
        let category = entry.category;
        match self.writer.write(entry) {
            Ok(_) => true,
            Err(e) => {
                warn!(category = %category, error = %e, "audit write dropped");
                false
            }
        }
    }
}

/// Resolve the file partition for an audit event.
///
/// Anything touching a patient record is tracked under `phi_access`;
/// otherwise the resource type picks its own category when it names one,
/// falling back to the general access log.
fn category_for(event: &AuditEvent) -> LogCategory {
    if event.patient_id.is_some() {
        return LogCategory::PhiAccess;
    }
    event
        .resource_type
        .parse::<LogCategory>()
        .unwrap_or(LogCategory::Access)
}
