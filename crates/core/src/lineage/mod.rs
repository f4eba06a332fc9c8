#![forbid(unsafe_code)]

mod canonical;
mod forest;
mod trace;
mod types;

pub use canonical::{SEAL_DOMAIN_V1, canonical_data, json_escape, seal_payload};
pub use forest::{Forest, ForestError};
pub use trace::{MAX_TRACE_DEPTH, Trace, TraceEntry};
pub use types::{Batch, BatchData, BatchNode, FieldScalar, FieldValue};

#[cfg(test)]
mod tests;
