#![forbid(unsafe_code)]

use lt_storage::StoreError;

/// Stable error code strings exposed on the wire. Consumers branch on the
/// code; the message is for operators.
pub(crate) fn error_code(err: &StoreError) -> &'static str {
    match err {
        StoreError::TemplateNotFound { .. }
        | StoreError::StageNotFound { .. }
        | StoreError::UnknownBatch { .. } => "NOT_FOUND",
        StoreError::InvalidStageSequence { .. } | StoreError::TemplateMismatch { .. } => {
            "INVALID_STAGE_SEQUENCE"
        }
        StoreError::Locked { .. } => "LOCKED",
        StoreError::AlreadyLocked { .. } => "ALREADY_LOCKED",
        StoreError::TraceDepthExceeded { .. } => "DEPTH_EXCEEDED",
        StoreError::InvalidInput(_)
        | StoreError::Json(_)
        | StoreError::StageOrderNotContiguous { .. }
        | StoreError::UnknownField { .. }
        | StoreError::FieldKindMismatch { .. } => "INVALID_INPUT",
        StoreError::Io(_) | StoreError::Sql(_) | StoreError::ForestInvariant { .. } => "INTERNAL",
    }
}

/// User-facing text. Locked/AlreadyLocked are everyday conditions and must
/// read as "already certified", not as a server fault.
pub(crate) fn format_store_error(err: &StoreError) -> String {
    match err {
        StoreError::Locked { id } => {
            format!("Batch {id} is already certified; its data is read-only")
        }
        StoreError::AlreadyLocked { id } => {
            format!("Batch {id} is already certified; sealing is a one-time action")
        }
        StoreError::TraceDepthExceeded { id } => format!(
            "Trace of {id} exceeded the ancestry depth cap; the stored lineage is likely corrupted"
        ),
        other => other.to_string(),
    }
}
