#![forbid(unsafe_code)]

use super::types::BatchData;

/// Defensive cap on ancestry walks. Real processes stay under ~10 stages;
/// hitting this means a parent cycle corrupted the forest invariant.
pub const MAX_TRACE_DEPTH: usize = 64;

/// One ancestor's contribution to a public trace.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceEntry {
    pub batch_id: String,
    pub stage_id: i64,
    pub stage_name: String,
    pub stage_order: u32,
    pub data: BatchData,
    pub is_locked: bool,
    pub blockchain_hash: Option<String>,
    pub created_at_ms: i64,
}

/// Root-to-leaf ordered history of one batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    /// The store walks parent pointers leaf-to-root; public display wants
    /// root-to-leaf, so the walk is reversed here.
    pub fn from_walk(mut walked: Vec<TraceEntry>) -> Self {
        walked.reverse();
        Self { entries: walked }
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stage-name keyed view for the public tracking page. Stage names are
    /// unique along a valid chain; if two entries ever collapse onto the
    /// same name, the later (deeper) entry wins.
    pub fn stage_keyed(&self) -> Vec<(&str, &TraceEntry)> {
        let mut out: Vec<(&str, &TraceEntry)> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if let Some(slot) = out.iter_mut().find(|(name, _)| *name == entry.stage_name) {
                slot.1 = entry;
            } else {
                out.push((entry.stage_name.as_str(), entry));
            }
        }
        out
    }
}
