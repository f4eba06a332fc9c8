#![forbid(unsafe_code)]

use crate::ops::{self, OpError};
use crate::support::{SessionLog, error_code, format_store_error, now_ms_i64, now_rfc3339};
use lt_storage::{SqliteStore, StoreError};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct ApiRequest {
    pub op: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub params: Option<Value>,
}

pub struct ApiServer {
    store: SqliteStore,
    session: SessionLog,
}

impl ApiServer {
    pub fn new(store: SqliteStore) -> Self {
        let session = SessionLog::new(store.storage_dir());
        Self { store, session }
    }

    pub fn handle(&mut self, request: ApiRequest) -> Value {
        self.session.record_op(&request.op);
        let params = request.params.unwrap_or(Value::Null);
        let now_ms = now_ms_i64();

        let result = match request.op.as_str() {
            "ping" => Ok(json!({ "ok": true, "now": now_rfc3339() })),
            "template.create" => ops::template_create(&mut self.store, &params, now_ms),
            "template.get" => ops::template_get(&mut self.store, &params),
            "template.list" => ops::template_list(&mut self.store, &params),
            "stage.create" => ops::stage_create(&mut self.store, &params),
            "stage.update" => ops::stage_update(&mut self.store, &params),
            "stage.list" => ops::stage_list(&mut self.store, &params),
            "batch.create" => ops::batch_create(&mut self.store, &params, now_ms),
            "batch.update" => ops::batch_update(&mut self.store, &params),
            "batch.get" => ops::batch_get(&mut self.store, &params),
            "batch.seal" => ops::batch_seal(&mut self.store, &params),
            "batch.delete_subtree" => ops::batch_delete_subtree(&mut self.store, &params),
            "forest.view" => ops::forest_view(&mut self.store, &params),
            "trace.view" => ops::trace_view(&mut self.store, &params),
            "gs1.resolve" => ops::gs1_resolve(&mut self.store, &params),
            unknown => Err(OpError::Params(format!("unknown op: {unknown}"))),
        };

        match result {
            Ok(body) => response(request.id, body),
            Err(OpError::Params(message)) => {
                self.session.record_error("INVALID_INPUT", &message);
                error_response(request.id, "INVALID_INPUT", &message)
            }
            Err(OpError::Store(err)) => {
                let code = error_code(&err);
                let message = format_store_error(&err);
                if matches!(
                    err,
                    StoreError::TraceDepthExceeded { .. } | StoreError::ForestInvariant { .. }
                ) {
                    self.session.record_integrity_alert(&message);
                }
                self.session.record_error(code, &message);
                error_response(request.id, code, &message)
            }
        }
    }
}

pub fn response(id: Option<Value>, result: Value) -> Value {
    json!({ "id": id, "result": result })
}

pub fn error_response(id: Option<Value>, code: &str, message: &str) -> Value {
    json!({ "id": id, "error": { "code": code, "message": message } })
}
