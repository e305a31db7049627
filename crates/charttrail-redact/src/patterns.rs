//! Content-pattern scrubbing.
//!
//! These regexes run over every sanitized string regardless of which field
//! it came from — a belated safety net for callers that forgot to mark a
//! field sensitive.  Pattern matching is inherently heuristic and can both
//! over- and under-redact; the primary guarantee comes from the
//! field-name-aware pass in `fields`.

use std::sync::LazyLock;

use regex::Regex;

/// Content patterns in match-priority order.
///
/// Specific shapes (SSN, dates) run before the generic long-digit rule so
/// they get their own token.  Patterns are static and compile-time-checked
/// by tests, so `expect` here cannot fire at runtime.
static CONTENT_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("SSN regex is valid"),
            "[SSN-REDACTED]",
        ),
        (
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .expect("email regex is valid"),
            "[EMAIL-REDACTED]",
        ),
        // Two common date orders: ISO (YYYY-MM-DD) and US (MM/DD/YYYY).
        (
            Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("ISO date regex is valid"),
            "[DOB-REDACTED]",
        ),
        (
            Regex::new(r"\b\d{1,2}/\d{1,2}/\d{4}\b").expect("US date regex is valid"),
            "[DOB-REDACTED]",
        ),
        (
            Regex::new(r"\(?\b\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b")
                .expect("phone regex is valid"),
            "[PHONE-REDACTED]",
        ),
        // Bare 8+ digit runs: MRNs, account numbers, contiguous SSNs.
        (
            Regex::new(r"\b\d{8,}\b").expect("identifier regex is valid"),
            "[ID-REDACTED]",
        ),
    ]
});

/// Replace every content-pattern match with its redaction token.
pub(crate) fn scrub(input: &str) -> String {
    let mut out = input.to_string();
    for (pattern, token) in CONTENT_PATTERNS.iter() {
        out = pattern.replace_all(&out, *token).into_owned();
    }
    out
}

/// Remove control characters.
pub(crate) fn strip_control(input: &str) -> String {
    input.chars().filter(|c| !c.is_control()).collect()
}

/// The entities `html_escape` may have produced on a previous pass.
const KNOWN_ENTITIES: [&str; 5] = ["amp;", "lt;", "gt;", "quot;", "#x27;"];

/// HTML-escape `<`, `>`, `"`, `'`, and `&`.
///
/// An `&` that already begins one of our own entities is left alone, so
/// escaping an already-escaped string is a no-op.
pub(crate) fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '&' => {
                let rest = &input[i + 1..];
                if KNOWN_ENTITIES.iter().any(|e| rest.starts_with(e)) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Truncate to at most `cap` characters, on a char boundary.
pub(crate) fn truncate(input: &str, cap: usize) -> String {
    match input.char_indices().nth(cap) {
        Some((byte_idx, _)) => input[..byte_idx].to_string(),
        None => input.to_string(),
    }
}
