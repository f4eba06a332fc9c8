#![forbid(unsafe_code)]

use super::json::{field_defs_from_json, field_defs_to_json};
use super::{
    CreateStageRequest, CreateTemplateRequest, SqliteStore, StoreError, UpdateStageRequest,
    canonicalize_tenant, ensure_tenant_tx,
};
use lt_core::schema::{Stage, Template, validate_stage_orders};
use rusqlite::{OptionalExtension, Transaction, params};

impl SqliteStore {
    pub fn create_template(&mut self, request: CreateTemplateRequest) -> Result<Template, StoreError> {
        let tenant = canonicalize_tenant(&request.tenant)?;
        let name = request.name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("template name must not be empty"));
        }

        let tx = self.conn.transaction()?;
        ensure_tenant_tx(&tx, &tenant, request.created_at_ms)?;
        tx.execute(
            "INSERT INTO templates(tenant, name, created_at_ms) VALUES (?1, ?2, ?3)",
            params![tenant, name, request.created_at_ms],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Template {
            id,
            tenant,
            name: name.to_string(),
            created_at_ms: request.created_at_ms,
        })
    }

    pub fn get_template(&self, template_id: i64) -> Result<Template, StoreError> {
        self.conn
            .query_row(
                "SELECT id, tenant, name, created_at_ms FROM templates WHERE id=?1",
                params![template_id],
                |row| {
                    Ok(Template {
                        id: row.get(0)?,
                        tenant: row.get(1)?,
                        name: row.get(2)?,
                        created_at_ms: row.get(3)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::TemplateNotFound { template_id })
    }

    pub fn list_templates(&self, tenant: &str) -> Result<Vec<Template>, StoreError> {
        let tenant = canonicalize_tenant(tenant)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, tenant, name, created_at_ms FROM templates \
             WHERE tenant=?1 ORDER BY created_at_ms, id",
        )?;
        let rows = stmt.query_map(params![tenant], |row| {
            Ok(Template {
                id: row.get(0)?,
                tenant: row.get(1)?,
                name: row.get(2)?,
                created_at_ms: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Appends a stage (order omitted) or places it at the explicit order,
    /// which must be exactly the next free one. Either way the template's
    /// orders stay the contiguous sequence 1..=n.
    pub fn create_stage(&mut self, request: CreateStageRequest) -> Result<Stage, StoreError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("stage name must not be empty"));
        }

        let tx = self.conn.transaction()?;
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

        let max_order: u32 = tx.query_row(
            "SELECT COALESCE(MAX(ord), 0) FROM stages WHERE template_id=?1",
            params![request.template_id],
            |row| row.get(0),
        )?;
        let next = max_order + 1;
        let order = request.order.unwrap_or(next);
        if order != next {
            return Err(StoreError::StageOrderNotContiguous {
                expected: next,
                actual: order,
            });
        }

        tx.execute(
            "INSERT INTO stages(template_id, ord, name, inputs_json, outputs_json, \
             variables_json, primary_output_field) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                request.template_id,
                order,
                name,
                field_defs_to_json(&request.inputs),
                field_defs_to_json(&request.outputs),
                field_defs_to_json(&request.variables),
                request.primary_output_field,
            ],
        )?;
        let id = tx.last_insert_rowid();

        let orders = stage_orders_tx(&tx, request.template_id)?;
        validate_stage_orders(&orders)
            .map_err(|err| StoreError::InvalidInput(err.message()))?;

        tx.commit()?;

        Ok(Stage {
            id,
            template_id: request.template_id,
            order,
            name: name.to_string(),
            inputs: request.inputs,
            outputs: request.outputs,
            variables: request.variables,
            primary_output_field: request.primary_output_field,
        })
    }

    /// Renames a stage or replaces parts of its field schema. Order is not
    /// editable here; resequencing would silently change the meaning of
    /// historical batches.
    pub fn update_stage(&mut self, request: UpdateStageRequest) -> Result<Stage, StoreError> {
        let tx = self.conn.transaction()?;
        let Some(existing) = stage_row_tx(&tx, request.stage_id)? else {
            return Err(StoreError::StageNotFound {
                stage_id: request.stage_id,
            });
        };

        let name = match request.name.as_deref() {
            Some(name) if name.trim().is_empty() => {
                return Err(StoreError::InvalidInput("stage name must not be empty"));
            }
            Some(name) => name.trim().to_string(),
            None => existing.name,
        };
        let inputs = request.inputs.unwrap_or(existing.inputs);
        let outputs = request.outputs.unwrap_or(existing.outputs);
        let variables = request.variables.unwrap_or(existing.variables);
        let primary_output_field = request
            .primary_output_field
            .or(existing.primary_output_field);

        tx.execute(
            "UPDATE stages SET name=?2, inputs_json=?3, outputs_json=?4, variables_json=?5, \
             primary_output_field=?6 WHERE id=?1",
            params![
                request.stage_id,
                name,
                field_defs_to_json(&inputs),
                field_defs_to_json(&outputs),
                field_defs_to_json(&variables),
                primary_output_field,
            ],
        )?;
        tx.commit()?;

        Ok(Stage {
            id: request.stage_id,
            template_id: existing.template_id,
            order: existing.order,
            name,
            inputs,
            outputs,
            variables,
            primary_output_field,
        })
    }

    pub fn get_stage(&self, stage_id: i64) -> Result<Stage, StoreError> {
        stage_row(&self.conn, stage_id)?.ok_or(StoreError::StageNotFound { stage_id })
    }

    pub fn list_stages(&self, template_id: i64) -> Result<Vec<Stage>, StoreError> {
        self.get_template(template_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, template_id, ord, name, inputs_json, outputs_json, variables_json, \
             primary_output_field FROM stages WHERE template_id=?1 ORDER BY ord",
        )?;
        let rows = stmt.query_map(params![template_id], read_stage_columns)?;
        let mut stages = Vec::new();
        for row in rows {
            stages.push(row?.into_stage()?);
        }
        Ok(stages)
    }

    /// Data-integrity probe for the surrounding CRUD layer: editing or
    /// removing a stage that batches already reference would change the
    /// meaning of historical records.
    pub fn stage_in_use(&self, stage_id: i64) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM batches WHERE stage_id=?1",
            params![stage_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

pub(in crate::store) struct StageRow {
    pub id: i64,
    pub template_id: i64,
    pub order: u32,
    pub name: String,
    pub inputs_json: String,
    pub outputs_json: String,
    pub variables_json: String,
    pub primary_output_field: Option<String>,
}

impl StageRow {
    pub(in crate::store) fn into_stage(self) -> Result<Stage, StoreError> {
        Ok(Stage {
            id: self.id,
            template_id: self.template_id,
            order: self.order,
            name: self.name,
            inputs: field_defs_from_json(&self.inputs_json)?,
            outputs: field_defs_from_json(&self.outputs_json)?,
            variables: field_defs_from_json(&self.variables_json)?,
            primary_output_field: self.primary_output_field,
        })
    }
}

fn read_stage_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<StageRow> {
    Ok(StageRow {
        id: row.get(0)?,
        template_id: row.get(1)?,
        order: row.get(2)?,
        name: row.get(3)?,
        inputs_json: row.get(4)?,
        outputs_json: row.get(5)?,
        variables_json: row.get(6)?,
        primary_output_field: row.get(7)?,
    })
}

const STAGE_QUERY: &str = "SELECT id, template_id, ord, name, inputs_json, outputs_json, \
                           variables_json, primary_output_field FROM stages WHERE id=?1";

pub(in crate::store) fn stage_row_tx(
    tx: &Transaction<'_>,
    stage_id: i64,
) -> Result<Option<Stage>, StoreError> {
    let row = tx
        .query_row(STAGE_QUERY, params![stage_id], read_stage_columns)
        .optional()?;
    row.map(StageRow::into_stage).transpose()
}

fn stage_row(conn: &rusqlite::Connection, stage_id: i64) -> Result<Option<Stage>, StoreError> {
    let row = conn
        .query_row(STAGE_QUERY, params![stage_id], read_stage_columns)
        .optional()?;
    row.map(StageRow::into_stage).transpose()
}

fn stage_orders_tx(tx: &Transaction<'_>, template_id: i64) -> Result<Vec<u32>, StoreError> {
    let mut stmt = tx.prepare("SELECT ord FROM stages WHERE template_id=?1 ORDER BY ord")?;
    let rows = stmt.query_map(params![template_id], |row| row.get::<_, u32>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
