#![forbid(unsafe_code)]

use super::OpError;
use crate::support::{batch_to_value, data_from_params, opt_str, require_i64, require_str};
use lt_storage::{CreateBatchRequest, SqliteStore, UpdateBatchRequest};
use serde_json::{Value, json};

pub(crate) fn batch_create(
    store: &mut SqliteStore,
    params: &Value,
    now_ms: i64,
) -> Result<Value, OpError> {
    let batch = store.create_batch(CreateBatchRequest {
        tenant: require_str(params, "tenant")?.to_string(),
        template_id: require_i64(params, "template_id")?,
        stage_id: require_i64(params, "stage_id")?,
        parent_id: opt_str(params, "parent_id"),
        acquisition_id: opt_str(params, "acquisition_id"),
        status: opt_str(params, "status"),
        data: data_from_params(params)?,
        created_at_ms: now_ms,
    })?;
    Ok(batch_to_value(&batch))
}

pub(crate) fn batch_update(store: &mut SqliteStore, params: &Value) -> Result<Value, OpError> {
    let batch = store.update_batch(UpdateBatchRequest {
        tenant: require_str(params, "tenant")?.to_string(),
        batch_id: require_str(params, "batch_id")?.to_string(),
        data: data_from_params(params)?,
        status: opt_str(params, "status"),
    })?;
    Ok(batch_to_value(&batch))
}

pub(crate) fn batch_get(store: &mut SqliteStore, params: &Value) -> Result<Value, OpError> {
    let batch = store.get_batch(
        require_str(params, "tenant")?,
        require_str(params, "batch_id")?,
    )?;
    Ok(batch_to_value(&batch))
}

pub(crate) fn batch_seal(store: &mut SqliteStore, params: &Value) -> Result<Value, OpError> {
    let cert = store.seal_batch(
        require_str(params, "tenant")?,
        require_str(params, "batch_id")?,
    )?;
    Ok(json!({
        "batch_id": cert.batch_id,
        "blockchain_hash": cert.hash,
        "is_locked": true,
    }))
}

pub(crate) fn batch_delete_subtree(
    store: &mut SqliteStore,
    params: &Value,
) -> Result<Value, OpError> {
    let deleted = store.delete_subtree(
        require_str(params, "tenant")?,
        require_str(params, "batch_id")?,
    )?;
    Ok(json!({ "deleted": deleted }))
}
