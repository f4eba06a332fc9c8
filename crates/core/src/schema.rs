#![forbid(unsafe_code)]

use crate::lineage::{BatchData, FieldScalar};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    Date,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Bool => "bool",
            FieldKind::Date => "date",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "text" => Some(FieldKind::Text),
            "number" => Some(FieldKind::Number),
            "bool" => Some(FieldKind::Bool),
            "date" => Some(FieldKind::Date),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub visible_default: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub id: i64,
    pub tenant: String,
    pub name: String,
    pub created_at_ms: i64,
}

/// One step of a template's process. Field schemas are split into inputs
/// (what enters the stage), outputs (what the stage produces) and variables
/// (process measurements). `primary_output_field` names the output that
/// dashboards treat as the stage's headline quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub id: i64,
    pub template_id: i64,
    pub order: u32,
    pub name: String,
    pub inputs: Vec<FieldDef>,
    pub outputs: Vec<FieldDef>,
    pub variables: Vec<FieldDef>,
    pub primary_output_field: Option<String>,
}

impl Stage {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .chain(self.variables.iter())
            .find(|def| def.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageOrderError {
    Empty,
    NotStartingAtOne { first: u32 },
    Gap { expected: u32, actual: u32 },
    Duplicate { order: u32 },
}

impl StageOrderError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "template has no stages",
            Self::NotStartingAtOne { .. } => "stage orders must start at 1",
            Self::Gap { .. } => "stage orders must be contiguous",
            Self::Duplicate { .. } => "stage order is duplicated",
        }
    }
}

/// Stage orders within a template must form the contiguous sequence 1..=n.
/// The input must already be sorted ascending (the store reads it that way).
pub fn validate_stage_orders(orders: &[u32]) -> Result<(), StageOrderError> {
    let Some(&first) = orders.first() else {
        return Err(StageOrderError::Empty);
    };
    if first != 1 {
        return Err(StageOrderError::NotStartingAtOne { first });
    }
    for window in orders.windows(2) {
        let (prev, next) = (window[0], window[1]);
        if next == prev {
            return Err(StageOrderError::Duplicate { order: next });
        }
        if next != prev + 1 {
            return Err(StageOrderError::Gap {
                expected: prev + 1,
                actual: next,
            });
        }
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSchemaError {
    UnknownField { field: String },
    KindMismatch { field: String, expected: FieldKind },
}

/// Every field written to a batch must exist in the owning stage's schema
/// and carry a scalar of the declared kind. Date fields travel as text.
pub fn validate_data(stage: &Stage, data: &BatchData) -> Result<(), DataSchemaError> {
    for (name, field) in data {
        let Some(def) = stage.field(name) else {
            return Err(DataSchemaError::UnknownField {
                field: name.clone(),
            });
        };
        let matches = match def.kind {
            FieldKind::Text | FieldKind::Date => matches!(field.value, FieldScalar::Text(_)),
            FieldKind::Number => matches!(field.value, FieldScalar::Number(_)),
            FieldKind::Bool => matches!(field.value, FieldScalar::Bool(_)),
        };
        if !matches {
            return Err(DataSchemaError::KindMismatch {
                field: name.clone(),
                expected: def.kind,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::FieldValue;

    fn stage_with_fields() -> Stage {
        Stage {
            id: 1,
            template_id: 1,
            order: 1,
            name: "Cosecha".to_string(),
            inputs: vec![],
            outputs: vec![FieldDef {
                name: "pesoCosecha".to_string(),
                label: "Peso cosechado".to_string(),
                kind: FieldKind::Number,
                visible_default: true,
            }],
            variables: vec![FieldDef {
                name: "fechaCosecha".to_string(),
                label: "Fecha".to_string(),
                kind: FieldKind::Date,
                visible_default: false,
            }],
            primary_output_field: Some("pesoCosecha".to_string()),
        }
    }

    #[test]
    fn stage_orders_must_be_contiguous_from_one() {
        assert!(validate_stage_orders(&[1, 2, 3]).is_ok());
        assert_eq!(validate_stage_orders(&[]).unwrap_err(), StageOrderError::Empty);
        assert_eq!(
            validate_stage_orders(&[2, 3]).unwrap_err(),
            StageOrderError::NotStartingAtOne { first: 2 }
        );
        assert_eq!(
            validate_stage_orders(&[1, 3]).unwrap_err(),
            StageOrderError::Gap {
                expected: 2,
                actual: 3
            }
        );
        assert_eq!(
            validate_stage_orders(&[1, 1, 2]).unwrap_err(),
            StageOrderError::Duplicate { order: 1 }
        );
    }

    #[test]
    fn data_validation_rejects_unknown_fields_and_kind_mismatches() {
        let stage = stage_with_fields();

        let mut data = crate::lineage::BatchData::new();
        data.insert(
            "pesoCosecha".to_string(),
            FieldValue::visible(FieldScalar::Number(100.0)),
        );
        data.insert(
            "fechaCosecha".to_string(),
            FieldValue::visible(FieldScalar::Text("2024-05-01".to_string())),
        );
        assert!(validate_data(&stage, &data).is_ok());

        let mut unknown = crate::lineage::BatchData::new();
        unknown.insert(
            "pesoFantasma".to_string(),
            FieldValue::visible(FieldScalar::Number(1.0)),
        );
        assert_eq!(
            validate_data(&stage, &unknown).unwrap_err(),
            DataSchemaError::UnknownField {
                field: "pesoFantasma".to_string()
            }
        );

        let mut mismatch = crate::lineage::BatchData::new();
        mismatch.insert(
            "pesoCosecha".to_string(),
            FieldValue::visible(FieldScalar::Text("mucho".to_string())),
        );
        assert_eq!(
            validate_data(&stage, &mismatch).unwrap_err(),
            DataSchemaError::KindMismatch {
                field: "pesoCosecha".to_string(),
                expected: FieldKind::Number
            }
        );
    }
}
