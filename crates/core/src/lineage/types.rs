#![forbid(unsafe_code)]

use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub enum FieldScalar {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl FieldScalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldScalar::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldScalar::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// One recorded value on a batch. `visible` controls whether the public
/// trace page shows the field; `label` overrides the schema label when the
/// operator renamed it for this batch.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldValue {
    pub value: FieldScalar,
    pub visible: bool,
    pub label: Option<String>,
}

impl FieldValue {
    pub fn visible(value: FieldScalar) -> Self {
        Self {
            value,
            visible: true,
            label: None,
        }
    }
}

/// Field name -> value map. BTreeMap keeps key order deterministic, which
/// the canonical seal serialization depends on.
pub type BatchData = BTreeMap<String, FieldValue>;

#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub id: String,
    pub tenant: String,
    pub template_id: i64,
    pub stage_id: i64,
    pub parent_id: Option<String>,
    pub acquisition_id: Option<String>,
    pub status: Option<String>,
    pub data: BatchData,
    pub is_locked: bool,
    pub blockchain_hash: Option<String>,
    pub created_at_ms: i64,
}

impl Batch {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Nested dashboard view of a batch and its descendants.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchNode {
    pub batch: Batch,
    pub children: Vec<BatchNode>,
}
