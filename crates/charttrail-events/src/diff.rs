//! Changed-field computation for update events.
//!
//! Comparison is deliberately loose: values arriving from form layers and
//! database layers frequently disagree on scalar types, so `"5"` and `5`
//! must count as equal.  Arrays and maps are compared by their canonical
//! JSON serialization.

use std::collections::{BTreeMap, BTreeSet};

use charttrail_contracts::CtxValue;

/// The fields that changed between `old` and `new`, sorted.
///
/// A field counts as modified when it is present in `new` with a loosely
/// unequal value, present in `new` but absent in `old`, or present in
/// `old` but removed in `new`.
pub fn modified_fields(
    old: &BTreeMap<String, CtxValue>,
    new: &BTreeMap<String, CtxValue>,
) -> Vec<String> {
    let mut fields = BTreeSet::new();

    for (key, new_value) in new {
        match old.get(key) {
            Some(old_value) if loosely_equal(old_value, new_value) => {}
            _ => {
                fields.insert(key.clone());
            }
        }
    }
    for key in old.keys() {
        if !new.contains_key(key) {
            fields.insert(key.clone());
        }
    }

    fields.into_iter().collect()
}

/// Type-coercing equality.
///
/// Same-kind scalars compare directly (ints and floats cross-compare
/// numerically); arrays and maps compare by canonical serialization;
/// mismatched kinds compare by string form, so `Int(5)` equals `Str("5")`.
pub fn loosely_equal(a: &CtxValue, b: &CtxValue) -> bool {
    match (a, b) {
        (CtxValue::Int(x), CtxValue::Float(y)) | (CtxValue::Float(y), CtxValue::Int(x)) => {
            (*x as f64) == *y
        }
        (CtxValue::Array(_), CtxValue::Array(_)) | (CtxValue::Map(_), CtxValue::Map(_)) => {
            a.canonical() == b.canonical()
        }
        (CtxValue::Null, CtxValue::Null)
        | (CtxValue::Bool(_), CtxValue::Bool(_))
        | (CtxValue::Int(_), CtxValue::Int(_))
        | (CtxValue::Float(_), CtxValue::Float(_))
        | (CtxValue::Str(_), CtxValue::Str(_)) => a == b,
        _ => string_form(a) == string_form(b),
    }
}

/// The string a value coerces to for mismatched-kind comparison.
fn string_form(value: &CtxValue) -> String {
    match value {
        CtxValue::Str(s) => s.clone(),
        other => other.canonical(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, CtxValue)]) -> BTreeMap<String, CtxValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn unchanged_fields_are_not_reported() {
        let old = map(&[("bp", CtxValue::from("120/80")), ("hr", CtxValue::Int(72))]);
        let new = map(&[("bp", CtxValue::from("120/80")), ("hr", CtxValue::Int(72))]);
        assert!(modified_fields(&old, &new).is_empty());
    }

    #[test]
    fn changed_added_and_removed_fields_are_reported_sorted() {
        let old = map(&[
            ("bp", CtxValue::from("120/80")),
            ("hr", CtxValue::Int(72)),
            ("temp", CtxValue::Float(98.6)),
        ]);
        let new = map(&[
            ("bp", CtxValue::from("130/85")),   // changed
            ("hr", CtxValue::Int(72)),          // unchanged
            ("spo2", CtxValue::Int(98)),        // added
                                                // temp removed
        ]);
        assert_eq!(modified_fields(&old, &new), vec!["bp", "spo2", "temp"]);
    }

    #[test]
    fn numeric_string_and_number_are_equal() {
        assert!(loosely_equal(&CtxValue::Int(5), &CtxValue::Str("5".to_string())));
        assert!(loosely_equal(&CtxValue::Str("true".to_string()), &CtxValue::Bool(true)));
        assert!(!loosely_equal(&CtxValue::Int(5), &CtxValue::Str("6".to_string())));
    }

    #[test]
    fn int_and_float_cross_compare_numerically() {
        assert!(loosely_equal(&CtxValue::Int(5), &CtxValue::Float(5.0)));
        assert!(!loosely_equal(&CtxValue::Int(5), &CtxValue::Float(5.5)));
    }

    #[test]
    fn arrays_compare_by_canonical_serialization() {
        let a = CtxValue::Array(vec![CtxValue::Int(1), CtxValue::Int(2)]);
        let b = CtxValue::Array(vec![CtxValue::Int(1), CtxValue::Int(2)]);
        let c = CtxValue::Array(vec![CtxValue::Int(2), CtxValue::Int(1)]);
        assert!(loosely_equal(&a, &b));
        assert!(!loosely_equal(&a, &c));
    }

    #[test]
    fn nested_map_changes_are_detected() {
        let old = map(&[(
            "meds",
            CtxValue::Map(map(&[("lisinopril", CtxValue::from("10mg"))])),
        )]);
        let new = map(&[(
            "meds",
            CtxValue::Map(map(&[("lisinopril", CtxValue::from("20mg"))])),
        )]);
        assert_eq!(modified_fields(&old, &new), vec!["meds"]);
    }
}
