//! The closed context-value type.
//!
//! `CtxValue` replaces loosely-typed context maps with a tagged value the
//! redactor can recurse over exhaustively — no reflection, no surprises.
//! It serializes as natural JSON (untagged), so persisted entries read like
//! plain objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A context value attached to a log entry or audit event.
///
/// Variant order matters for untagged deserialization: integers are tried
/// before floats so `5` decodes as `Int(5)`, not `Float(5.0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CtxValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<CtxValue>),
    Map(BTreeMap<String, CtxValue>),
}

impl CtxValue {
    /// Convert an arbitrary `serde_json::Value` into a `CtxValue`.
    ///
    /// Numbers that fit neither `i64` nor `f64` (u64 above `i64::MAX`) are
    /// stringified rather than dropped.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CtxValue::Null,
            serde_json::Value::Bool(b) => CtxValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CtxValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    CtxValue::Float(f)
                } else {
                    CtxValue::Str(n.to_string())
                }
            }
            serde_json::Value::String(s) => CtxValue::Str(s),
            serde_json::Value::Array(items) => {
                CtxValue::Array(items.into_iter().map(CtxValue::from_json).collect())
            }
            serde_json::Value::Object(fields) => CtxValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, CtxValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// The string content, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CtxValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Canonical JSON form of this value.
    ///
    /// Maps serialize with sorted keys (`BTreeMap`), so two structurally
    /// equal values always produce identical bytes.
    pub fn canonical(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }
}

impl From<&str> for CtxValue {
    fn from(s: &str) -> Self {
        CtxValue::Str(s.to_string())
    }
}

impl From<String> for CtxValue {
    fn from(s: String) -> Self {
        CtxValue::Str(s)
    }
}

impl From<i64> for CtxValue {
    fn from(i: i64) -> Self {
        CtxValue::Int(i)
    }
}

impl From<bool> for CtxValue {
    fn from(b: bool) -> Self {
        CtxValue::Bool(b)
    }
}
