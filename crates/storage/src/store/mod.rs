#![forbid(unsafe_code)]

mod batches;
mod delete;
mod error;
mod json;
mod requests;
mod seal;
mod templates;
mod trace;

pub use error::StoreError;
pub use requests::*;
pub use seal::SealedCertificate;

use lt_core::ids::TenantId;
use lt_core::lineage::Batch;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

const BATCH_COUNTER: &str = "batches";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join("lotrace.db");
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tenants (
          tenant TEXT PRIMARY KEY,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS counters (
          tenant TEXT NOT NULL,
          name TEXT NOT NULL,
          value INTEGER NOT NULL,
          PRIMARY KEY (tenant, name)
        );

        CREATE TABLE IF NOT EXISTS templates (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          tenant TEXT NOT NULL,
          name TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS stages (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          template_id INTEGER NOT NULL REFERENCES templates(id),
          ord INTEGER NOT NULL,
          name TEXT NOT NULL,
          inputs_json TEXT NOT NULL,
          outputs_json TEXT NOT NULL,
          variables_json TEXT NOT NULL,
          primary_output_field TEXT,
          UNIQUE (template_id, ord)
        );

        CREATE TABLE IF NOT EXISTS batches (
          id TEXT PRIMARY KEY,
          tenant TEXT NOT NULL,
          template_id INTEGER NOT NULL REFERENCES templates(id),
          stage_id INTEGER NOT NULL REFERENCES stages(id),
          parent_id TEXT REFERENCES batches(id),
          acquisition_id TEXT,
          status TEXT,
          data_json TEXT NOT NULL,
          is_locked INTEGER NOT NULL DEFAULT 0,
          blockchain_hash TEXT,
          created_at_ms INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_batches_tenant
          ON batches(tenant, created_at_ms);
        CREATE INDEX IF NOT EXISTS idx_batches_parent
          ON batches(parent_id);

        INSERT OR IGNORE INTO meta(key, value) VALUES ('schema_version', '1');
        "#,
    )?;
    Ok(())
}

pub(in crate::store) fn canonicalize_tenant(value: &str) -> Result<String, StoreError> {
    TenantId::try_new(value)
        .map(TenantId::into_string)
        .map_err(|err| StoreError::InvalidInput(err.message()))
}

pub(in crate::store) fn ensure_tenant_tx(
    tx: &Transaction<'_>,
    tenant: &str,
    created_at_ms: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT OR IGNORE INTO tenants(tenant, created_at_ms) VALUES (?1, ?2)",
        params![tenant, created_at_ms],
    )?;
    Ok(())
}

pub(in crate::store) fn next_counter_tx(
    tx: &Transaction<'_>,
    tenant: &str,
    name: &str,
) -> Result<i64, StoreError> {
    let current: Option<i64> = tx
        .query_row(
            "SELECT value FROM counters WHERE tenant=?1 AND name=?2",
            params![tenant, name],
            |row| row.get(0),
        )
        .optional()?;
    let next = current.unwrap_or(0) + 1;
    tx.execute(
        "INSERT INTO counters(tenant, name, value) VALUES (?1, ?2, ?3) \
         ON CONFLICT(tenant, name) DO UPDATE SET value=excluded.value",
        params![tenant, name, next],
    )?;
    Ok(next)
}

pub(in crate::store) struct BatchRow {
    pub id: String,
    pub tenant: String,
    pub template_id: i64,
    pub stage_id: i64,
    pub parent_id: Option<String>,
    pub acquisition_id: Option<String>,
    pub status: Option<String>,
    pub data_json: String,
    pub is_locked: bool,
    pub blockchain_hash: Option<String>,
    pub created_at_ms: i64,
}

impl BatchRow {
    pub(in crate::store) fn into_batch(self) -> Result<Batch, StoreError> {
        let data = json::data_from_json(&self.data_json)?;
        Ok(Batch {
            id: self.id,
            tenant: self.tenant,
            template_id: self.template_id,
            stage_id: self.stage_id,
            parent_id: self.parent_id,
            acquisition_id: self.acquisition_id,
            status: self.status,
            data,
            is_locked: self.is_locked,
            blockchain_hash: self.blockchain_hash,
            created_at_ms: self.created_at_ms,
        })
    }
}

const BATCH_COLUMNS: &str = "id, tenant, template_id, stage_id, parent_id, acquisition_id, \
                             status, data_json, is_locked, blockchain_hash, created_at_ms";

pub(in crate::store) fn read_batch_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BatchRow> {
    Ok(BatchRow {
        id: row.get(0)?,
        tenant: row.get(1)?,
        template_id: row.get(2)?,
        stage_id: row.get(3)?,
        parent_id: row.get(4)?,
        acquisition_id: row.get(5)?,
        status: row.get(6)?,
        data_json: row.get(7)?,
        is_locked: row.get::<_, i64>(8)? != 0,
        blockchain_hash: row.get(9)?,
        created_at_ms: row.get(10)?,
    })
}

pub(in crate::store) fn batch_row_tx(
    tx: &Transaction<'_>,
    tenant: &str,
    id: &str,
) -> Result<Option<BatchRow>, StoreError> {
    let row = tx
        .query_row(
            &format!("SELECT {BATCH_COLUMNS} FROM batches WHERE tenant=?1 AND id=?2"),
            params![tenant, id],
            read_batch_row,
        )
        .optional()?;
    Ok(row)
}

pub(in crate::store) fn batch_row(
    conn: &Connection,
    tenant: &str,
    id: &str,
) -> Result<Option<BatchRow>, StoreError> {
    let row = conn
        .query_row(
            &format!("SELECT {BATCH_COLUMNS} FROM batches WHERE tenant=?1 AND id=?2"),
            params![tenant, id],
            read_batch_row,
        )
        .optional()?;
    Ok(row)
}
