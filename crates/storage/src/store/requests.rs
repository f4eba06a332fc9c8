#![forbid(unsafe_code)]

use lt_core::lineage::BatchData;
use lt_core::schema::FieldDef;

#[derive(Clone, Debug, PartialEq)]
pub struct CreateTemplateRequest {
    pub tenant: String,
    pub name: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateStageRequest {
    pub template_id: i64,
    pub name: String,
    /// None appends at the end; an explicit value must equal the next
    /// free order so the contiguous sequence is preserved.
    pub order: Option<u32>,
    pub inputs: Vec<FieldDef>,
    pub outputs: Vec<FieldDef>,
    pub variables: Vec<FieldDef>,
    pub primary_output_field: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateStageRequest {
    pub stage_id: i64,
    pub name: Option<String>,
    pub inputs: Option<Vec<FieldDef>>,
    pub outputs: Option<Vec<FieldDef>>,
    pub variables: Option<Vec<FieldDef>>,
    pub primary_output_field: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateBatchRequest {
    pub tenant: String,
    pub template_id: i64,
    pub stage_id: i64,
    pub parent_id: Option<String>,
    pub acquisition_id: Option<String>,
    pub status: Option<String>,
    pub data: BatchData,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateBatchRequest {
    pub tenant: String,
    pub batch_id: String,
    /// Merged field-by-field into the stored map; fields absent here keep
    /// their stored value (stage edits append to carried-over context).
    pub data: BatchData,
    pub status: Option<String>,
}
