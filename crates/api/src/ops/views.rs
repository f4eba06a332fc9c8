#![forbid(unsafe_code)]

use super::OpError;
use crate::support::{node_to_value, opt_bool, require_str, trace_to_value};
use lt_storage::{SqliteStore, StoreError};
use serde_json::{Value, json};

pub(crate) fn forest_view(store: &mut SqliteStore, params: &Value) -> Result<Value, OpError> {
    let tenant = require_str(params, "tenant")?;
    let roots = store.forest(tenant)?;
    Ok(json!({
        "tenant": tenant,
        "roots": roots.iter().map(node_to_value).collect::<Vec<_>>(),
    }))
}

pub(crate) fn trace_view(store: &mut SqliteStore, params: &Value) -> Result<Value, OpError> {
    let tenant = require_str(params, "tenant")?;
    let batch_id = require_str(params, "batch_id")?;
    let public_only = opt_bool(params, "public");
    let trace = store.trace(tenant, batch_id)?;
    Ok(trace_to_value(&trace, public_only))
}

/// GS1 Digital Link resolution: the resolver only needs existence and the
/// batch status to pick a redirect target, so an unknown id is a normal
/// negative answer here, not an error.
pub(crate) fn gs1_resolve(store: &mut SqliteStore, params: &Value) -> Result<Value, OpError> {
    let tenant = require_str(params, "tenant")?;
    let batch_id = require_str(params, "batch_id")?;
    match store.get_batch(tenant, batch_id) {
        Ok(batch) => {
            let recall = batch.status.as_deref() == Some("recall");
            Ok(json!({
                "exists": true,
                "status": batch.status,
                "recall": recall,
            }))
        }
        Err(StoreError::UnknownBatch { .. }) => Ok(json!({
            "exists": false,
            "status": Value::Null,
            "recall": false,
        })),
        Err(err) => Err(err.into()),
    }
}
