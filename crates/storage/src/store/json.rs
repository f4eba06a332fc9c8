#![forbid(unsafe_code)]

use super::StoreError;
use lt_core::lineage::{BatchData, FieldScalar, FieldValue};
use lt_core::schema::{FieldDef, FieldKind};
use serde_json::{Map, Value, json};

pub(in crate::store) fn data_to_json(data: &BatchData) -> String {
    let mut out = Map::new();
    for (name, field) in data {
        let value = match &field.value {
            FieldScalar::Text(text) => Value::String(text.clone()),
            FieldScalar::Number(number) => json!(number),
            FieldScalar::Bool(flag) => Value::Bool(*flag),
        };
        out.insert(
            name.clone(),
            json!({
                "value": value,
                "visible": field.visible,
                "label": field.label,
            }),
        );
    }
    Value::Object(out).to_string()
}

pub(in crate::store) fn data_from_json(raw: &str) -> Result<BatchData, StoreError> {
    let parsed: Value = serde_json::from_str(raw)?;
    let Some(object) = parsed.as_object() else {
        return Err(StoreError::InvalidInput("batch data must be a JSON object"));
    };

    let mut data = BatchData::new();
    for (name, entry) in object {
        let Some(entry) = entry.as_object() else {
            return Err(StoreError::InvalidInput("batch field must be an object"));
        };
        let value = match entry.get("value") {
            Some(Value::String(text)) => FieldScalar::Text(text.clone()),
            Some(Value::Number(number)) => {
                let Some(number) = number.as_f64() else {
                    return Err(StoreError::InvalidInput("field number out of range"));
                };
                FieldScalar::Number(number)
            }
            Some(Value::Bool(flag)) => FieldScalar::Bool(*flag),
            _ => return Err(StoreError::InvalidInput("field value must be a scalar")),
        };
        let visible = entry
            .get("visible")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let label = entry
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_string);
        data.insert(
            name.clone(),
            FieldValue {
                value,
                visible,
                label,
            },
        );
    }
    Ok(data)
}

pub(in crate::store) fn field_defs_to_json(defs: &[FieldDef]) -> String {
    let entries: Vec<Value> = defs
        .iter()
        .map(|def| {
            json!({
                "name": def.name,
                "label": def.label,
                "kind": def.kind.as_str(),
                "visible": def.visible_default,
            })
        })
        .collect();
    Value::Array(entries).to_string()
}

pub(in crate::store) fn field_defs_from_json(raw: &str) -> Result<Vec<FieldDef>, StoreError> {
    let parsed: Value = serde_json::from_str(raw)?;
    let Some(entries) = parsed.as_array() else {
        return Err(StoreError::InvalidInput("field schema must be a JSON array"));
    };

    let mut defs = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(entry) = entry.as_object() else {
            return Err(StoreError::InvalidInput("field def must be an object"));
        };
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            return Err(StoreError::InvalidInput("field def is missing a name"));
        };
        let label = entry
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or(name)
            .to_string();
        let kind = entry
            .get("kind")
            .and_then(Value::as_str)
            .and_then(FieldKind::parse)
            .ok_or(StoreError::InvalidInput("field def has an unknown kind"))?;
        let visible_default = entry
            .get("visible")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        defs.push(FieldDef {
            name: name.to_string(),
            label,
            kind,
            visible_default,
        });
    }
    Ok(defs)
}
