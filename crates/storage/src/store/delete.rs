#![forbid(unsafe_code)]

use super::{SqliteStore, StoreError, canonicalize_tenant};
use rusqlite::{OptionalExtension, Transaction, params};

impl SqliteStore {
    /// Deletes a batch and every descendant in one transaction. If any batch
    /// in the subtree is sealed, the whole operation is rejected and nothing
    /// is deleted; a certified record cannot silently disappear. Returns the
    /// number of batches removed.
    pub fn delete_subtree(&mut self, tenant: &str, root_id: &str) -> Result<usize, StoreError> {
        let tenant = canonicalize_tenant(tenant)?;

        let tx = self.conn.transaction()?;
        let subtree = collect_subtree_tx(&tx, &tenant, root_id)?;
        if subtree.is_empty() {
            return Err(StoreError::UnknownBatch {
                id: root_id.to_string(),
            });
        }

        if let Some(locked) = subtree.iter().find(|entry| entry.is_locked) {
            return Err(StoreError::Locked {
                id: locked.id.clone(),
            });
        }

        // Children before parents: parent_id is a self-referencing FK.
        for entry in subtree.iter().rev() {
            tx.execute(
                "DELETE FROM batches WHERE tenant=?1 AND id=?2",
                params![tenant, entry.id],
            )?;
        }
        tx.commit()?;

        Ok(subtree.len())
    }
}

struct SubtreeEntry {
    id: String,
    is_locked: bool,
}

/// Iterative closure over the parent-to-children index, in
/// parent-before-descendant order. Empty when the root is unknown.
fn collect_subtree_tx(
    tx: &Transaction<'_>,
    tenant: &str,
    root_id: &str,
) -> Result<Vec<SubtreeEntry>, StoreError> {
    let root = tx
        .query_row(
            "SELECT id, is_locked FROM batches WHERE tenant=?1 AND id=?2",
            params![tenant, root_id],
            read_entry,
        )
        .optional()?;
    let Some(root) = root else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        let mut stmt =
            tx.prepare("SELECT id, is_locked FROM batches WHERE tenant=?1 AND parent_id=?2")?;
        let rows = stmt.query_map(params![tenant, current.id], read_entry)?;
        for child in rows {
            stack.push(child?);
        }
        out.push(current);
    }
    Ok(out)
}

fn read_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<SubtreeEntry> {
    Ok(SubtreeEntry {
        id: row.get(0)?,
        is_locked: row.get::<_, i64>(1)? != 0,
    })
}
