#![forbid(unsafe_code)]

use super::{SqliteStore, StoreError, batch_row_tx, canonicalize_tenant};
use lt_core::lineage::seal_payload;
use rusqlite::{OptionalExtension, params};
use sha2::Digest as _;
use std::fmt::Write as _;

/// Result of sealing a batch: the certification hash now stored on the
/// record. The hash is an opaque hex string to every external consumer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedCertificate {
    pub batch_id: String,
    pub hash: String,
}

impl SqliteStore {
    /// Seals a batch: reads its data, chains it to the parent's hash and
    /// persists `blockchain_hash` + the lock flag, all in one transaction so
    /// no edit can interleave between read and seal. Sealing is terminal;
    /// a second call fails with AlreadyLocked instead of recomputing.
    pub fn seal_batch(&mut self, tenant: &str, batch_id: &str) -> Result<SealedCertificate, StoreError> {
        let tenant = canonicalize_tenant(tenant)?;

        let tx = self.conn.transaction()?;
        let Some(row) = batch_row_tx(&tx, &tenant, batch_id)? else {
            return Err(StoreError::UnknownBatch {
                id: batch_id.to_string(),
            });
        };
        if row.is_locked {
            return Err(StoreError::AlreadyLocked { id: row.id });
        }

        let parent_hash: String = match row.parent_id.as_deref() {
            Some(parent_id) => tx
                .query_row(
                    "SELECT blockchain_hash FROM batches WHERE tenant=?1 AND id=?2",
                    params![tenant, parent_id],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()?
                .flatten()
                .unwrap_or_default(),
            None => String::new(),
        };

        let data = super::json::data_from_json(&row.data_json)?;
        let payload = seal_payload(&data, &parent_hash, &row.id);
        let hash = sha256_hex(payload.as_bytes());

        tx.execute(
            "UPDATE batches SET blockchain_hash=?3, is_locked=1 WHERE tenant=?1 AND id=?2",
            params![tenant, row.id, hash],
        )?;
        tx.commit()?;

        Ok(SealedCertificate {
            batch_id: row.id,
            hash,
        })
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}
