#![forbid(unsafe_code)]

use lt_core::lineage::{Batch, BatchData, BatchNode, FieldScalar, FieldValue, Trace};
use lt_core::schema::{FieldDef, FieldKind, Stage, Template};
use serde_json::{Map, Value, json};

/// Parses the `data` param: `{"field": {"value": ..., "visible": ..., "label": ...}}`,
/// with a bare scalar accepted as shorthand for a visible field.
pub(crate) fn data_from_params(params: &Value) -> Result<BatchData, String> {
    let mut data = BatchData::new();
    let Some(raw) = params.get("data") else {
        return Ok(data);
    };
    let Some(object) = raw.as_object() else {
        return Err("data: expected an object".to_string());
    };

    for (name, entry) in object {
        let field = match entry {
            Value::Object(body) => {
                let value = scalar_from_value(body.get("value").unwrap_or(&Value::Null))
                    .ok_or_else(|| format!("data.{name}.value: expected a scalar"))?;
                FieldValue {
                    value,
                    visible: body.get("visible").and_then(Value::as_bool).unwrap_or(true),
                    label: body.get("label").and_then(Value::as_str).map(str::to_string),
                }
            }
            scalar => FieldValue::visible(
                scalar_from_value(scalar)
                    .ok_or_else(|| format!("data.{name}: expected a scalar"))?,
            ),
        };
        data.insert(name.clone(), field);
    }
    Ok(data)
}

fn scalar_from_value(value: &Value) -> Option<FieldScalar> {
    match value {
        Value::String(text) => Some(FieldScalar::Text(text.clone())),
        Value::Number(number) => number.as_f64().map(FieldScalar::Number),
        Value::Bool(flag) => Some(FieldScalar::Bool(*flag)),
        _ => None,
    }
}

fn scalar_to_value(scalar: &FieldScalar) -> Value {
    match scalar {
        FieldScalar::Text(text) => Value::String(text.clone()),
        FieldScalar::Number(number) => json!(number),
        FieldScalar::Bool(flag) => Value::Bool(*flag),
    }
}

/// Parses a field-schema param: `[{"name", "label", "kind", "visible"}]`.
pub(crate) fn field_defs_from_params(params: &Value, field: &str) -> Result<Vec<FieldDef>, String> {
    let Some(raw) = params.get(field) else {
        return Ok(Vec::new());
    };
    let Some(entries) = raw.as_array() else {
        return Err(format!("{field}: expected an array"));
    };

    let mut defs = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            return Err(format!("{field}: every field def needs a name"));
        };
        let kind = match entry.get("kind").and_then(Value::as_str) {
            None => FieldKind::Text,
            Some(raw) => {
                FieldKind::parse(raw).ok_or_else(|| format!("{field}.{name}: unknown kind {raw}"))?
            }
        };
        defs.push(FieldDef {
            name: name.to_string(),
            label: entry
                .get("label")
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string(),
            kind,
            visible_default: entry.get("visible").and_then(Value::as_bool).unwrap_or(true),
        });
    }
    Ok(defs)
}

pub(crate) fn data_to_value(data: &BatchData, public_only: bool) -> Value {
    let mut out = Map::new();
    for (name, field) in data {
        if public_only && !field.visible {
            continue;
        }
        out.insert(
            name.clone(),
            json!({
                "value": scalar_to_value(&field.value),
                "visible": field.visible,
                "label": field.label,
            }),
        );
    }
    Value::Object(out)
}

pub(crate) fn batch_to_value(batch: &Batch) -> Value {
    json!({
        "id": batch.id,
        "template_id": batch.template_id,
        "stage_id": batch.stage_id,
        "parent_id": batch.parent_id,
        "acquisition_id": batch.acquisition_id,
        "status": batch.status,
        "data": data_to_value(&batch.data, false),
        "is_locked": batch.is_locked,
        "blockchain_hash": batch.blockchain_hash,
        "created_at_ms": batch.created_at_ms,
        "created_at": super::ts_ms_to_rfc3339(batch.created_at_ms),
    })
}

pub(crate) fn node_to_value(node: &BatchNode) -> Value {
    let children: Vec<Value> = node.children.iter().map(node_to_value).collect();
    let mut body = batch_to_value(&node.batch);
    if let Some(object) = body.as_object_mut() {
        object.insert("children".to_string(), Value::Array(children));
    }
    body
}

/// Entries stay an ordered array (root first); an object keyed by stage
/// name would not survive serialization with its order intact.
pub(crate) fn trace_to_value(trace: &Trace, public_only: bool) -> Value {
    let entries: Vec<Value> = trace
        .entries()
        .iter()
        .map(|entry| {
            json!({
                "batch_id": entry.batch_id,
                "stage": entry.stage_name,
                "stage_order": entry.stage_order,
                "data": data_to_value(&entry.data, public_only),
                "is_locked": entry.is_locked,
                "blockchain_hash": entry.blockchain_hash,
                "created_at": super::ts_ms_to_rfc3339(entry.created_at_ms),
            })
        })
        .collect();
    json!({ "entries": entries })
}

pub(crate) fn template_to_value(template: &Template) -> Value {
    json!({
        "id": template.id,
        "tenant": template.tenant,
        "name": template.name,
        "created_at_ms": template.created_at_ms,
    })
}

pub(crate) fn field_defs_to_value(defs: &[FieldDef]) -> Value {
    Value::Array(
        defs.iter()
            .map(|def| {
                json!({
                    "name": def.name,
                    "label": def.label,
                    "kind": def.kind.as_str(),
                    "visible": def.visible_default,
                })
            })
            .collect(),
    )
}

pub(crate) fn stage_to_value(stage: &Stage) -> Value {
    json!({
        "id": stage.id,
        "template_id": stage.template_id,
        "order": stage.order,
        "name": stage.name,
        "inputs": field_defs_to_value(&stage.inputs),
        "outputs": field_defs_to_value(&stage.outputs),
        "variables": field_defs_to_value(&stage.variables),
        "primary_output_field": stage.primary_output_field,
    })
}
