//! Field-name-aware redaction and masking.
//!
//! This is the primary PHI guarantee: a key on the redact list loses its
//! value entirely; a key on the mask list keeps only its last four
//! characters.  Matching is on the lower-cased key, by substring, so
//! `user_password` and `patient_ssn` are caught as well.

/// Replacement for values under redact-list keys.
pub const REDACTED_TOKEN: &str = "[REDACTED]";

/// Replacement for empty values under mask-list keys.
pub const EMPTY_TOKEN: &str = "[EMPTY]";

/// Keys whose values are dropped entirely.
const REDACT_KEYS: [&str; 12] = [
    "ssn",
    "social_security",
    "password",
    "passwd",
    "secret",
    "api_key",
    "apikey",
    "card_number",
    "credit_card",
    "cvv",
    "bank_account",
    "routing_number",
];

/// Keys whose values keep only their last four characters.
const MASK_KEYS: [&str; 8] = [
    "dob",
    "date_of_birth",
    "birth_date",
    "phone",
    "mobile",
    "email",
    "address",
    "street",
];

/// Should this key's value be replaced with [`REDACTED_TOKEN`]?
pub(crate) fn is_redact_key(key: &str) -> bool {
    let lowered = key.to_lowercase();
    REDACT_KEYS.iter().any(|k| lowered.contains(k))
}

/// Should this key's value be partially masked?
///
/// Checked after the redact list — redaction wins when both match.
pub(crate) fn is_mask_key(key: &str) -> bool {
    let lowered = key.to_lowercase();
    MASK_KEYS.iter().any(|k| lowered.contains(k))
}

/// Mask a value down to its last four characters.
///
/// Length is preserved only up to eight leading stars so a mask never
/// reveals how long a very long value was.  Already-masked output maps to
/// itself, keeping the overall sanitize pass idempotent.
pub(crate) fn mask_value(value: &str) -> String {
    if value.is_empty() || value == EMPTY_TOKEN {
        return EMPTY_TOKEN.to_string();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let stars = (chars.len() - 4).min(8);
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(stars), tail)
}
