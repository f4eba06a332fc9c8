#![forbid(unsafe_code)]

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    Json(serde_json::Error),
    InvalidInput(&'static str),
    TemplateNotFound { template_id: i64 },
    StageNotFound { stage_id: i64 },
    UnknownBatch { id: String },
    StageOrderNotContiguous { expected: u32, actual: u32 },
    InvalidStageSequence { expected: u32, actual: u32 },
    TemplateMismatch { parent_template: i64, stage_template: i64 },
    UnknownField { field: String },
    FieldKindMismatch { field: String, expected: &'static str },
    Locked { id: String },
    AlreadyLocked { id: String },
    TraceDepthExceeded { id: String },
    ForestInvariant { detail: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::Json(err) => write!(f, "json: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::TemplateNotFound { template_id } => {
                write!(f, "template not found (id={template_id})")
            }
            Self::StageNotFound { stage_id } => write!(f, "stage not found (id={stage_id})"),
            Self::UnknownBatch { id } => write!(f, "unknown batch: {id}"),
            Self::StageOrderNotContiguous { expected, actual } => write!(
                f,
                "stage order must stay contiguous (expected={expected}, actual={actual})"
            ),
            Self::InvalidStageSequence { expected, actual } => write!(
                f,
                "invalid stage sequence (expected order {expected}, got {actual})"
            ),
            Self::TemplateMismatch {
                parent_template,
                stage_template,
            } => write!(
                f,
                "stage template {stage_template} differs from parent template {parent_template}"
            ),
            Self::UnknownField { field } => write!(f, "unknown field: {field}"),
            Self::FieldKindMismatch { field, expected } => {
                write!(f, "field {field} expects a {expected} value")
            }
            Self::Locked { id } => write!(f, "batch {id} is already certified and read-only"),
            Self::AlreadyLocked { id } => write!(f, "batch {id} is already certified"),
            Self::TraceDepthExceeded { id } => {
                write!(f, "trace aborted for {id}: ancestry depth cap hit")
            }
            Self::ForestInvariant { detail } => write!(f, "forest invariant violated: {detail}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
