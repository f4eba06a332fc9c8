#![forbid(unsafe_code)]

use super::{SqliteStore, StoreError, canonicalize_tenant};
use lt_core::lineage::{MAX_TRACE_DEPTH, Trace, TraceEntry};
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// Walks parent pointers from any batch up to its root and returns the
    /// root-to-leaf history, each entry keyed by its stage. The walk is
    /// capped at MAX_TRACE_DEPTH; hitting the cap means the forest invariant
    /// was violated upstream and is reported, never truncated silently.
    pub fn trace(&self, tenant: &str, batch_id: &str) -> Result<Trace, StoreError> {
        let tenant = canonicalize_tenant(tenant)?;

        let mut walked: Vec<TraceEntry> = Vec::new();
        let mut current = Some(batch_id.to_string());
        while let Some(id) = current {
            if walked.len() >= MAX_TRACE_DEPTH {
                return Err(StoreError::TraceDepthExceeded {
                    id: batch_id.to_string(),
                });
            }

            let row = self
                .conn
                .query_row(
                    "SELECT b.id, b.parent_id, b.data_json, b.is_locked, b.blockchain_hash, \
                     b.created_at_ms, s.id, s.name, s.ord \
                     FROM batches b JOIN stages s ON s.id = b.stage_id \
                     WHERE b.tenant=?1 AND b.id=?2",
                    params![tenant, id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, i64>(3)? != 0,
                            row.get::<_, Option<String>>(4)?,
                            row.get::<_, i64>(5)?,
                            row.get::<_, i64>(6)?,
                            row.get::<_, String>(7)?,
                            row.get::<_, u32>(8)?,
                        ))
                    },
                )
                .optional()?;

            let Some((
                id,
                parent_id,
                data_json,
                is_locked,
                blockchain_hash,
                created_at_ms,
                stage_id,
                stage_name,
                stage_order,
            )) = row
            else {
                // The starting batch must exist; a missing ancestor mid-walk
                // is the same corruption signal as a cycle.
                if walked.is_empty() {
                    return Err(StoreError::UnknownBatch {
                        id: batch_id.to_string(),
                    });
                }
                return Err(StoreError::ForestInvariant {
                    detail: format!("ancestor {id} of {batch_id} is missing"),
                });
            };

            walked.push(TraceEntry {
                batch_id: id,
                stage_id,
                stage_name,
                stage_order,
                data: super::json::data_from_json(&data_json)?,
                is_locked,
                blockchain_hash,
                created_at_ms,
            });
            current = parent_id;
        }

        Ok(Trace::from_walk(walked))
    }
}
