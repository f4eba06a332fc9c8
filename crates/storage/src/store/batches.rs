#![forbid(unsafe_code)]

use super::json::data_to_json;
use super::templates::stage_row_tx;
use super::{
    BATCH_COUNTER, CreateBatchRequest, SqliteStore, StoreError, UpdateBatchRequest, batch_row,
    batch_row_tx, canonicalize_tenant, ensure_tenant_tx, next_counter_tx, read_batch_row,
};
use lt_core::ids::derive_batch_id;
use lt_core::lineage::{Batch, BatchNode, Forest};
use lt_core::schema::{DataSchemaError, Stage, validate_data};
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// Creates a batch at a stage, optionally branching from a parent batch.
    /// Root batches must sit on stage order 1; children must sit on the
    /// parent's template at exactly the parent's order + 1.
    pub fn create_batch(&mut self, request: CreateBatchRequest) -> Result<Batch, StoreError> {
        let tenant = canonicalize_tenant(&request.tenant)?;

        let tx = self.conn.transaction()?;
        ensure_tenant_tx(&tx, &tenant, request.created_at_ms)?;

        let template_exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM templates WHERE id=?1",
                params![request.template_id],
                |row| row.get(0),
            )
            .optional()?;
        if template_exists.is_none() {
            return Err(StoreError::TemplateNotFound {
                template_id: request.template_id,
            });
        }

        let Some(stage) = stage_row_tx(&tx, request.stage_id)? else {
            return Err(StoreError::StageNotFound {
                stage_id: request.stage_id,
            });
        };
        if stage.template_id != request.template_id {
            return Err(StoreError::TemplateMismatch {
                parent_template: request.template_id,
                stage_template: stage.template_id,
            });
        }

        match request.parent_id.as_deref() {
            None => {
                if stage.order != 1 {
                    return Err(StoreError::InvalidStageSequence {
                        expected: 1,
                        actual: stage.order,
                    });
                }
            }
            Some(parent_id) => {
                let Some(parent) = batch_row_tx(&tx, &tenant, parent_id)? else {
                    return Err(StoreError::UnknownBatch {
                        id: parent_id.to_string(),
                    });
                };
                if parent.template_id != stage.template_id {
                    return Err(StoreError::TemplateMismatch {
                        parent_template: parent.template_id,
                        stage_template: stage.template_id,
                    });
                }
                let Some(parent_stage) = stage_row_tx(&tx, parent.stage_id)? else {
                    return Err(StoreError::StageNotFound {
                        stage_id: parent.stage_id,
                    });
                };
                if stage.order != parent_stage.order + 1 {
                    return Err(StoreError::InvalidStageSequence {
                        expected: parent_stage.order + 1,
                        actual: stage.order,
                    });
                }
            }
        }

        validate_batch_data(&stage, &request.data)?;

        let counter = next_counter_tx(&tx, &tenant, BATCH_COUNTER)?;
        let id = derive_batch_id(&stage.name, counter);

        tx.execute(
            "INSERT INTO batches(id, tenant, template_id, stage_id, parent_id, acquisition_id, \
             status, data_json, is_locked, blockchain_hash, created_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL, ?9)",
            params![
                id,
                tenant,
                request.template_id,
                request.stage_id,
                request.parent_id,
                request.acquisition_id,
                request.status,
                data_to_json(&request.data),
                request.created_at_ms,
            ],
        )?;
        tx.commit()?;

        Ok(Batch {
            id,
            tenant,
            template_id: request.template_id,
            stage_id: request.stage_id,
            parent_id: request.parent_id,
            acquisition_id: request.acquisition_id,
            status: request.status,
            data: request.data,
            is_locked: false,
            blockchain_hash: None,
            created_at_ms: request.created_at_ms,
        })
    }

    /// Merges a partial data update into an unlocked batch. Stored fields
    /// absent from the request keep their value.
    pub fn update_batch(&mut self, request: UpdateBatchRequest) -> Result<Batch, StoreError> {
        let tenant = canonicalize_tenant(&request.tenant)?;

        let tx = self.conn.transaction()?;
        let Some(row) = batch_row_tx(&tx, &tenant, &request.batch_id)? else {
            return Err(StoreError::UnknownBatch {
                id: request.batch_id,
            });
        };
        if row.is_locked {
            return Err(StoreError::Locked { id: row.id });
        }

        let Some(stage) = stage_row_tx(&tx, row.stage_id)? else {
            return Err(StoreError::StageNotFound {
                stage_id: row.stage_id,
            });
        };

        let mut batch = row.into_batch()?;
        for (name, field) in request.data {
            batch.data.insert(name, field);
        }
        validate_batch_data(&stage, &batch.data)?;
        if let Some(status) = request.status {
            batch.status = Some(status);
        }

        tx.execute(
            "UPDATE batches SET data_json=?3, status=?4 WHERE tenant=?1 AND id=?2",
            params![
                tenant,
                batch.id,
                data_to_json(&batch.data),
                batch.status,
            ],
        )?;
        tx.commit()?;

        Ok(batch)
    }

    pub fn get_batch(&self, tenant: &str, id: &str) -> Result<Batch, StoreError> {
        let tenant = canonicalize_tenant(tenant)?;
        let Some(row) = batch_row(&self.conn, &tenant, id)? else {
            return Err(StoreError::UnknownBatch { id: id.to_string() });
        };
        row.into_batch()
    }

    /// Flat batch list for a tenant, ordered so that children keep their
    /// creation order when the forest is assembled.
    pub fn list_batches(&self, tenant: &str) -> Result<Vec<Batch>, StoreError> {
        let tenant = canonicalize_tenant(tenant)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, tenant, template_id, stage_id, parent_id, acquisition_id, status, \
             data_json, is_locked, blockchain_hash, created_at_ms \
             FROM batches WHERE tenant=?1 ORDER BY created_at_ms, id",
        )?;
        let rows = stmt.query_map(params![tenant], read_batch_row)?;
        let mut batches = Vec::new();
        for row in rows {
            batches.push(row?.into_batch()?);
        }
        Ok(batches)
    }

    /// Dashboard view: the tenant's batches reassembled into root trees with
    /// nested children.
    pub fn forest(&self, tenant: &str) -> Result<Vec<BatchNode>, StoreError> {
        let batches = self.list_batches(tenant)?;
        let forest = Forest::build(batches).map_err(|err| StoreError::ForestInvariant {
            detail: err.to_string(),
        })?;
        Ok(forest.into_nodes())
    }
}

fn validate_batch_data(
    stage: &Stage,
    data: &lt_core::lineage::BatchData,
) -> Result<(), StoreError> {
    validate_data(stage, data).map_err(|err| match err {
        DataSchemaError::UnknownField { field } => StoreError::UnknownField { field },
        DataSchemaError::KindMismatch { field, expected } => StoreError::FieldKindMismatch {
            field,
            expected: expected.as_str(),
        },
    })
}
