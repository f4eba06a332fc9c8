#![forbid(unsafe_code)]

use super::OpError;
use crate::support::{
    field_defs_from_params, opt_str, opt_u32, require_i64, require_str, stage_to_value,
    template_to_value,
};
use lt_storage::{CreateStageRequest, CreateTemplateRequest, SqliteStore, UpdateStageRequest};
use serde_json::{Value, json};

pub(crate) fn template_create(
    store: &mut SqliteStore,
    params: &Value,
    now_ms: i64,
) -> Result<Value, OpError> {
    let template = store.create_template(CreateTemplateRequest {
        tenant: require_str(params, "tenant")?.to_string(),
        name: require_str(params, "name")?.to_string(),
        created_at_ms: now_ms,
    })?;
    Ok(template_to_value(&template))
}

pub(crate) fn template_get(store: &mut SqliteStore, params: &Value) -> Result<Value, OpError> {
    let template = store.get_template(require_i64(params, "template_id")?)?;
    Ok(template_to_value(&template))
}

pub(crate) fn template_list(store: &mut SqliteStore, params: &Value) -> Result<Value, OpError> {
    let templates = store.list_templates(require_str(params, "tenant")?)?;
    Ok(json!({
        "templates": templates.iter().map(template_to_value).collect::<Vec<_>>(),
    }))
}

pub(crate) fn stage_create(store: &mut SqliteStore, params: &Value) -> Result<Value, OpError> {
    let stage = store.create_stage(CreateStageRequest {
        template_id: require_i64(params, "template_id")?,
        name: require_str(params, "name")?.to_string(),
        order: opt_u32(params, "order")?,
        inputs: field_defs_from_params(params, "inputs")?,
        outputs: field_defs_from_params(params, "outputs")?,
        variables: field_defs_from_params(params, "variables")?,
        primary_output_field: opt_str(params, "primary_output_field"),
    })?;
    Ok(stage_to_value(&stage))
}

pub(crate) fn stage_update(store: &mut SqliteStore, params: &Value) -> Result<Value, OpError> {
    let inputs = match params.get("inputs") {
        None | Some(Value::Null) => None,
        Some(_) => Some(field_defs_from_params(params, "inputs")?),
    };
    let outputs = match params.get("outputs") {
        None | Some(Value::Null) => None,
        Some(_) => Some(field_defs_from_params(params, "outputs")?),
    };
    let variables = match params.get("variables") {
        None | Some(Value::Null) => None,
        Some(_) => Some(field_defs_from_params(params, "variables")?),
    };
    let stage = store.update_stage(UpdateStageRequest {
        stage_id: require_i64(params, "stage_id")?,
        name: opt_str(params, "name"),
        inputs,
        outputs,
        variables,
        primary_output_field: opt_str(params, "primary_output_field"),
    })?;
    Ok(stage_to_value(&stage))
}

pub(crate) fn stage_list(store: &mut SqliteStore, params: &Value) -> Result<Value, OpError> {
    let template_id = require_i64(params, "template_id")?;
    let stages = store.list_stages(template_id)?;
    let mut rendered = Vec::with_capacity(stages.len());
    for stage in &stages {
        let mut body = stage_to_value(stage);
        if let Some(object) = body.as_object_mut() {
            object.insert("in_use".to_string(), json!(store.stage_in_use(stage.id)?));
        }
        rendered.push(body);
    }
    Ok(json!({ "template_id": template_id, "stages": rendered }))
}
