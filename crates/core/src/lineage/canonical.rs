#![forbid(unsafe_code)]

use super::types::{BatchData, FieldScalar};
use std::fmt::Write as _;

/// Version tag mixed into every seal digest. Any change to the canonical
/// serialization below must bump this constant, or previously issued
/// certificates stop verifying.
pub const SEAL_DOMAIN_V1: &str = "lote-seal-v1";

/// Deterministic serialization of a batch's data map: fields in ascending
/// byte order of field name (BTreeMap iteration order), object keys in the
/// fixed sequence label/value/visible, strings escaped the same way on
/// every run, numbers in shortest round-trip form with integral values
/// rendered without a decimal point.
pub fn canonical_data(data: &BatchData) -> String {
    let mut out = String::with_capacity(64 + data.len() * 48);
    out.push('{');
    let mut first = true;
    for (name, field) in data {
        if !first {
            out.push(',');
        }
        first = false;
        out.push('"');
        out.push_str(&json_escape(name));
        out.push_str("\":{\"label\":");
        match field.label.as_deref() {
            Some(label) => {
                out.push('"');
                out.push_str(&json_escape(label));
                out.push('"');
            }
            None => out.push_str("null"),
        }
        out.push_str(",\"value\":");
        match &field.value {
            FieldScalar::Text(value) => {
                out.push('"');
                out.push_str(&json_escape(value));
                out.push('"');
            }
            FieldScalar::Number(value) => out.push_str(&canonical_number(*value)),
            FieldScalar::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
        }
        out.push_str(",\"visible\":");
        out.push_str(if field.visible { "true" } else { "false" });
        out.push('}');
    }
    out.push('}');
    out
}

/// The exact byte string fed to the seal digest:
/// `SEAL_DOMAIN_V1 ‖ canonical(data) ‖ '\n' ‖ parent_hash ‖ '\n' ‖ batch_id`.
/// Roots pass an empty `parent_hash`.
pub fn seal_payload(data: &BatchData, parent_hash: &str, batch_id: &str) -> String {
    let canonical = canonical_data(data);
    let mut out =
        String::with_capacity(SEAL_DOMAIN_V1.len() + canonical.len() + parent_hash.len() + batch_id.len() + 2);
    out.push_str(SEAL_DOMAIN_V1);
    out.push_str(&canonical);
    out.push('\n');
    out.push_str(parent_hash);
    out.push('\n');
    out.push_str(batch_id);
    out
}

fn canonical_number(value: f64) -> String {
    if !value.is_finite() {
        // NaN/inf cannot come from parsed JSON; normalize to null just in case.
        return "null".to_string();
    }
    if value == value.trunc() && value.abs() < 9_007_199_254_740_992.0 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

pub fn json_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
