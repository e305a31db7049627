//! The audit event builder — the "auditable operation" role.
//!
//! Given a business operation and its before/after state, produces a
//! normalized `AuditEvent`: computes the changed-field set for updates,
//! filters the value maps down to exactly those fields, and runs both
//! maps through the redactor so nothing sensitive survives construction.

use std::collections::BTreeMap;

use charttrail_contracts::{AuditAction, AuditEvent, CtxValue};
use charttrail_redact::Redactor;

use crate::diff;

/// Builder for one audit event.
#[derive(Debug)]
pub struct AuditEventBuilder {
    action: AuditAction,
    resource_type: String,
    resource_id: String,
    old_values: Option<BTreeMap<String, CtxValue>>,
    new_values: Option<BTreeMap<String, CtxValue>>,
    modified_fields: Option<Vec<String>>,
    patient_id: Option<String>,
    success: bool,
    error_message: Option<String>,
    description: Option<String>,
}

impl AuditEventBuilder {
    pub fn new(
        action: AuditAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            action,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            old_values: None,
            new_values: None,
            modified_fields: None,
            patient_id: None,
            success: true,
            error_message: None,
            description: None,
        }
    }

    pub fn old_values(mut self, values: BTreeMap<String, CtxValue>) -> Self {
        self.old_values = Some(values);
        self
    }

    pub fn new_values(mut self, values: BTreeMap<String, CtxValue>) -> Self {
        self.new_values = Some(values);
        self
    }

    /// Override the computed changed-field set.
    pub fn modified_fields(mut self, fields: Vec<String>) -> Self {
        self.modified_fields = Some(fields);
        self
    }

    pub fn patient_id(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    /// Mark the operation as failed, with the reason.
    pub fn failure(mut self, error_message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(error_message.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Produce the normalized, redacted event.
    ///
    /// For updates without an explicit `modified_fields` override, the set
    /// is derived from old/new; both maps are then filtered so unchanged
    /// fields are never persisted.
    pub fn build(self, redactor: &Redactor) -> AuditEvent {
        let empty = BTreeMap::new();

        let modified_fields = match (&self.modified_fields, self.action) {
            (Some(fields), _) => fields.clone(),
            (None, AuditAction::Update) => diff::modified_fields(
                self.old_values.as_ref().unwrap_or(&empty),
                self.new_values.as_ref().unwrap_or(&empty),
            ),
            (None, _) => Vec::new(),
        };

        let filter = |values: Option<BTreeMap<String, CtxValue>>| {
            values.map(|mut map| {
                if self.action == AuditAction::Update {
                    map.retain(|key, _| modified_fields.contains(key));
                }
                redactor.sanitize_context(&map)
            })
        };

        let description = self.description.unwrap_or_else(|| {
            format!(
                "{} {} {}",
                self.action, self.resource_type, self.resource_id
            )
        });

        AuditEvent {
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            old_values: filter(self.old_values),
            new_values: filter(self.new_values),
            modified_fields,
            patient_id: self.patient_id,
            success: self.success,
            error_message: self.error_message,
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use charttrail_redact::REDACTED_TOKEN;

    use super::*;

    fn map(pairs: &[(&str, CtxValue)]) -> BTreeMap<String, CtxValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn update_filters_values_to_modified_fields_exactly() {
        let redactor = Redactor::default();
        let event = AuditEventBuilder::new(AuditAction::Update, "encounter", "enc-7")
            .old_values(map(&[
                ("bp", CtxValue::from("120/80")),
                ("hr", CtxValue::Int(72)),
            ]))
            .new_values(map(&[
                ("bp", CtxValue::from("130/85")),
                ("hr", CtxValue::Int(72)),
            ]))
            .build(&redactor);

        assert_eq!(event.modified_fields, vec!["bp"]);
        let old = event.old_values.unwrap();
        let new = event.new_values.unwrap();
        assert_eq!(old.keys().collect::<Vec<_>>(), vec!["bp"]);
        assert_eq!(new.keys().collect::<Vec<_>>(), vec!["bp"]);
    }

    #[test]
    fn coerced_scalars_do_not_count_as_changes() {
        let redactor = Redactor::default();
        let event = AuditEventBuilder::new(AuditAction::Update, "vitals", "v-1")
            .old_values(map(&[("hr", CtxValue::from("72"))]))
            .new_values(map(&[("hr", CtxValue::Int(72))]))
            .build(&redactor);
        assert!(event.modified_fields.is_empty());
        assert!(event.new_values.unwrap().is_empty());
    }

    #[test]
    fn removed_fields_appear_in_modified_set() {
        let redactor = Redactor::default();
        let event = AuditEventBuilder::new(AuditAction::Update, "patient", "p-1")
            .old_values(map(&[("nickname", CtxValue::from("Al"))]))
            .new_values(map(&[]))
            .build(&redactor);
        assert_eq!(event.modified_fields, vec!["nickname"]);
    }

    #[test]
    fn explicit_modified_fields_override_the_diff() {
        let redactor = Redactor::default();
        let event = AuditEventBuilder::new(AuditAction::Update, "form", "f-1")
            .old_values(map(&[("a", CtxValue::Int(1))]))
            .new_values(map(&[("a", CtxValue::Int(2)), ("b", CtxValue::Int(3))]))
            .modified_fields(vec!["a".to_string()])
            .build(&redactor);
        assert_eq!(event.modified_fields, vec!["a"]);
        assert!(!event.new_values.unwrap().contains_key("b"));
    }

    #[test]
    fn create_keeps_full_new_values() {
        let redactor = Redactor::default();
        let event = AuditEventBuilder::new(AuditAction::Create, "patient", "p-2")
            .new_values(map(&[
                ("name", CtxValue::from("Alice")),
                ("mrn", CtxValue::from("A-100")),
            ]))
            .build(&redactor);
        assert!(event.modified_fields.is_empty());
        assert_eq!(event.new_values.unwrap().len(), 2);
    }

    #[test]
    fn values_pass_through_the_redactor() {
        let redactor = Redactor::default();
        let event = AuditEventBuilder::new(AuditAction::Update, "patient", "p-3")
            .old_values(map(&[("ssn", CtxValue::from("111-22-3333"))]))
            .new_values(map(&[("ssn", CtxValue::from("123-45-6789"))]))
            .build(&redactor);
        let new = event.new_values.unwrap();
        assert_eq!(new["ssn"], CtxValue::Str(REDACTED_TOKEN.to_string()));
    }

    #[test]
    fn failure_sets_success_and_error() {
        let redactor = Redactor::default();
        let event = AuditEventBuilder::new(AuditAction::AccessDenied, "chart", "c-9")
            .failure("no treatment relationship")
            .build(&redactor);
        assert!(!event.success);
        assert_eq!(
            event.error_message.as_deref(),
            Some("no treatment relationship")
        );
    }

    #[test]
    fn default_description_names_the_operation() {
        let redactor = Redactor::default();
        let event = AuditEventBuilder::new(AuditAction::Read, "chart", "c-1").build(&redactor);
        assert_eq!(event.description, "read chart c-1");
    }
}
