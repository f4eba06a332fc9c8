#![forbid(unsafe_code)]

use serde_json::Value;

pub(crate) fn require_str<'a>(params: &'a Value, field: &str) -> Result<&'a str, String> {
    params
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| format!("{field}: expected a non-empty string"))
}

pub(crate) fn require_i64(params: &Value, field: &str) -> Result<i64, String> {
    params
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| format!("{field}: expected an integer"))
}

pub(crate) fn opt_str(params: &Value, field: &str) -> Option<String> {
    params
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn opt_u32(params: &Value, field: &str) -> Result<Option<u32>, String> {
    match params.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|raw| u32::try_from(raw).ok())
            .map(Some)
            .ok_or_else(|| format!("{field}: expected a small non-negative integer")),
    }
}

pub(crate) fn opt_bool(params: &Value, field: &str) -> bool {
    params
        .get(field)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
