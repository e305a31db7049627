//! # charttrail-redact
//!
//! PHI redaction for the CHARTTRAIL audit core.
//!
//! Two layers, run in this order of authority:
//!
//! 1. **Field-name-aware** (`fields`) — keys on the redact list lose their
//!    value, keys on the mask list keep only the last four characters.
//!    This is the primary guarantee.
//! 2. **Content patterns** (`patterns`) — SSN/phone/email/DOB/identifier
//!    shapes are scrubbed from every string that survives, regardless of
//!    field name.  Best-effort defense in depth.
//!
//! The whole pass is idempotent (`sanitize(sanitize(x)) == sanitize(x)`)
//! and never panics; unrecognized value shapes are stringified before
//! masking.

mod fields;
mod patterns;

use std::collections::BTreeMap;

use charttrail_contracts::CtxValue;

pub use fields::{EMPTY_TOKEN, REDACTED_TOKEN};

/// Default character cap for top-level messages.
pub const DEFAULT_MESSAGE_CAP: usize = 2000;

/// Default character cap for nested context string values.
pub const DEFAULT_CONTEXT_CAP: usize = 500;

/// The full entity forms `html_escape` can emit, used to keep truncation
/// from splitting one (a split entity would re-escape on the next pass).
const ENTITY_FORMS: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&#x27;"];

/// The PHI scrubber.
///
/// Stateless apart from its two length caps; cheap to clone and share.
#[derive(Debug, Clone)]
pub struct Redactor {
    message_cap: usize,
    context_cap: usize,
}

impl Default for Redactor {
    fn default() -> Self {
        Self {
            message_cap: DEFAULT_MESSAGE_CAP,
            context_cap: DEFAULT_CONTEXT_CAP,
        }
    }
}

impl Redactor {
    /// Build a redactor with explicit message and context caps.
    pub fn new(message_cap: usize, context_cap: usize) -> Self {
        Self {
            message_cap,
            context_cap,
        }
    }

    /// Sanitize a top-level log message.
    pub fn sanitize_message(&self, raw: &str) -> String {
        self.sanitize_text(raw, self.message_cap)
    }

    /// Sanitize one string: strip control characters, HTML-escape, scrub
    /// content patterns, then truncate to `cap` characters.
    ///
    /// Truncation runs last so a pattern straddling the cap is redacted
    /// before the cut; the cut itself never splits an HTML entity.
    fn sanitize_text(&self, raw: &str, cap: usize) -> String {
        let cleaned = patterns::strip_control(raw);
        let escaped = patterns::html_escape(&cleaned);
        let scrubbed = patterns::scrub(&escaped);
        trim_partial_entity(patterns::truncate(&scrubbed, cap))
    }

    /// Sanitize a context mapping, recursing into nested maps and arrays.
    ///
    /// Keys are matched case-insensitively against the redact and mask
    /// lists; redaction wins when both match.  Original key spelling is
    /// preserved in the output.
    pub fn sanitize_context(
        &self,
        context: &BTreeMap<String, CtxValue>,
    ) -> BTreeMap<String, CtxValue> {
        context
            .iter()
            .map(|(key, value)| {
                let sanitized = if fields::is_redact_key(key) {
                    CtxValue::Str(REDACTED_TOKEN.to_string())
                } else if fields::is_mask_key(key) {
                    let raw = match value {
                        CtxValue::Str(s) => s.clone(),
                        other => other.canonical(),
                    };
                    CtxValue::Str(fields::mask_value(&raw))
                } else {
                    self.sanitize_value(value)
                };
                (key.clone(), sanitized)
            })
            .collect()
    }

    /// Sanitize a single value with no key context.
    ///
    /// Strings get the content scrub at the nested cap; maps and arrays
    /// recurse; scalars pass through untouched.
    pub fn sanitize_value(&self, value: &CtxValue) -> CtxValue {
        match value {
            CtxValue::Str(s) => CtxValue::Str(self.sanitize_text(s, self.context_cap)),
            CtxValue::Array(items) => {
                CtxValue::Array(items.iter().map(|v| self.sanitize_value(v)).collect())
            }
            CtxValue::Map(map) => CtxValue::Map(self.sanitize_context(map)),
            other => other.clone(),
        }
    }
}

/// Drop a trailing incomplete HTML entity left behind by truncation.
fn trim_partial_entity(mut s: String) -> String {
    if let Some(amp_idx) = s.rfind('&') {
        let tail = &s[amp_idx..];
        let is_partial = ENTITY_FORMS
            .iter()
            .any(|form| form.starts_with(tail) && *form != tail);
        if is_partial {
            s.truncate(amp_idx);
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use charttrail_contracts::CtxValue;

    use super::*;

    fn ctx(pairs: &[(&str, CtxValue)]) -> BTreeMap<String, CtxValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    // ── Message sanitation ───────────────────────────────────────────────────

    #[test]
    fn message_scrubs_ssn_email_phone() {
        let redactor = Redactor::default();
        let out = redactor.sanitize_message(
            "pt 123-45-6789 reached at 555-123-4567 or jane@clinic.example.com",
        );
        assert_eq!(
            out,
            "pt [SSN-REDACTED] reached at [PHONE-REDACTED] or [EMAIL-REDACTED]"
        );
    }

    #[test]
    fn message_html_escapes_and_strips_control() {
        let redactor = Redactor::default();
        let out = redactor.sanitize_message("note:\n<script>alert('x')</script>");
        assert!(!out.contains('\n'));
        assert!(out.contains("&lt;script&gt;"));
        assert!(out.contains("&#x27;x&#x27;"));
    }

    #[test]
    fn message_truncates_to_cap() {
        let redactor = Redactor::new(10, 5);
        let out = redactor.sanitize_message("abcdefghijklmnop");
        assert_eq!(out, "abcdefghij");
    }

    #[test]
    fn truncation_never_splits_an_entity() {
        // Cap lands in the middle of "&amp;".
        let redactor = Redactor::new(7, 5);
        let out = redactor.sanitize_message("abcde&f");
        // "abcde&amp;f" cut at 7 chars would leave "abcde&a"; the partial
        // entity is trimmed instead.
        assert_eq!(out, "abcde");
        assert_eq!(redactor.sanitize_message(&out), out);
    }

    #[test]
    fn message_sanitize_is_idempotent() {
        let redactor = Redactor::default();
        let inputs = [
            "ssn 123-45-6789 & dob 1984-02-29",
            "<b>call (555) 123-4567</b>",
            "plain text with no phi at all",
            "mrn 0012345678 email a@b.co",
            "quotes \"x\" and 'y' & ampersands &&",
        ];
        for input in inputs {
            let once = redactor.sanitize_message(input);
            let twice = redactor.sanitize_message(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn no_recognizable_phi_survives() {
        let redactor = Redactor::default();
        let out = redactor.sanitize_message(
            "123-45-6789 987654321 jane@x.org 555-867-5309 01/02/1990 2001-12-31",
        );
        assert!(!out.contains("123-45-6789"));
        assert!(!out.contains("987654321"));
        assert!(!out.contains("jane@x.org"));
        assert!(!out.contains("555-867-5309"));
        assert!(!out.contains("01/02/1990"));
        assert!(!out.contains("2001-12-31"));
    }

    // ── Context sanitation ───────────────────────────────────────────────────

    #[test]
    fn redact_list_keys_lose_their_values() {
        let redactor = Redactor::default();
        let out = redactor.sanitize_context(&ctx(&[
            ("ssn", CtxValue::from("123-45-6789")),
            ("user_password", CtxValue::from("hunter2")),
            ("diagnosis", CtxValue::from("hypertension")),
        ]));
        assert_eq!(out["ssn"], CtxValue::Str(REDACTED_TOKEN.to_string()));
        assert_eq!(
            out["user_password"],
            CtxValue::Str(REDACTED_TOKEN.to_string())
        );
        assert_eq!(out["diagnosis"], CtxValue::Str("hypertension".to_string()));
    }

    #[test]
    fn mask_list_keys_keep_last_four() {
        let redactor = Redactor::default();
        let out = redactor.sanitize_context(&ctx(&[
            ("phone", CtxValue::from("555-123-4567")),
            ("email", CtxValue::from("")),
        ]));
        assert_eq!(out["phone"], CtxValue::Str("********4567".to_string()));
        assert_eq!(out["email"], CtxValue::Str(EMPTY_TOKEN.to_string()));
    }

    #[test]
    fn non_string_masked_values_are_stringified() {
        let redactor = Redactor::default();
        let out = redactor.sanitize_context(&ctx(&[("dob", CtxValue::Int(19840229))]));
        assert_eq!(out["dob"], CtxValue::Str("****0229".to_string()));
    }

    #[test]
    fn recursion_reaches_nested_maps_and_arrays() {
        let redactor = Redactor::default();
        let nested = CtxValue::Map(ctx(&[
            ("ssn", CtxValue::from("123-45-6789")),
            ("note", CtxValue::from("reach at 555-123-4567")),
        ]));
        let out = redactor.sanitize_context(&ctx(&[
            ("patient", nested),
            (
                "attachments",
                CtxValue::Array(vec![CtxValue::from("email a@b.co")]),
            ),
        ]));

        let CtxValue::Map(patient) = &out["patient"] else {
            panic!("expected nested map");
        };
        assert_eq!(patient["ssn"], CtxValue::Str(REDACTED_TOKEN.to_string()));
        assert_eq!(
            patient["note"],
            CtxValue::Str("reach at [PHONE-REDACTED]".to_string())
        );
        let CtxValue::Array(items) = &out["attachments"] else {
            panic!("expected array");
        };
        assert_eq!(items[0], CtxValue::Str("email [EMAIL-REDACTED]".to_string()));
    }

    #[test]
    fn untouched_scalars_pass_through() {
        let redactor = Redactor::default();
        let out = redactor.sanitize_context(&ctx(&[
            ("count", CtxValue::Int(7)),
            ("ratio", CtxValue::Float(0.5)),
            ("ok", CtxValue::Bool(true)),
            ("missing", CtxValue::Null),
        ]));
        assert_eq!(out["count"], CtxValue::Int(7));
        assert_eq!(out["ratio"], CtxValue::Float(0.5));
        assert_eq!(out["ok"], CtxValue::Bool(true));
        assert_eq!(out["missing"], CtxValue::Null);
    }

    #[test]
    fn context_sanitize_is_idempotent() {
        let redactor = Redactor::default();
        let input = ctx(&[
            ("ssn", CtxValue::from("123-45-6789")),
            ("phone", CtxValue::from("555-123-4567")),
            ("dob", CtxValue::Int(19840229)),
            ("note", CtxValue::from("dob 1984-02-29 & more")),
            (
                "nested",
                CtxValue::Map(ctx(&[("email", CtxValue::from("a@b.co"))])),
            ),
        ]);
        let once = redactor.sanitize_context(&input);
        let twice = redactor.sanitize_context(&once);
        assert_eq!(once, twice);
    }
}
