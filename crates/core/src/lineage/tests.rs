use super::*;
use crate::ids::{BatchId, BatchIdError, derive_batch_id};

fn batch(id: &str, parent: Option<&str>, stage_id: i64, created_at_ms: i64) -> Batch {
    Batch {
        id: id.to_string(),
        tenant: "finca-demo".to_string(),
        template_id: 1,
        stage_id,
        parent_id: parent.map(str::to_string),
        acquisition_id: None,
        status: None,
        data: BatchData::new(),
        is_locked: false,
        blockchain_hash: None,
        created_at_ms,
    }
}

fn field(value: FieldScalar) -> FieldValue {
    FieldValue::visible(value)
}

#[test]
fn forest_build_preserves_every_batch() {
    let flat = vec![
        batch("COS-1", None, 1, 10),
        batch("FER-1", Some("COS-1"), 2, 20),
        batch("FER-2", Some("COS-1"), 2, 30),
        batch("SEC-1", Some("FER-1"), 3, 40),
        batch("COS-2", None, 1, 50),
    ];
    let forest = Forest::build(flat).unwrap();
    assert_eq!(forest.len(), 5);
    assert_eq!(forest.roots().len(), 2);

    let total: usize = forest
        .roots()
        .iter()
        .map(|&root| forest.descendants(root).len())
        .sum();
    assert_eq!(total, 5);
}

#[test]
fn forest_children_keep_insertion_order() {
    let flat = vec![
        batch("COS-1", None, 1, 10),
        batch("FER-1", Some("COS-1"), 2, 20),
        batch("FER-2", Some("COS-1"), 2, 30),
        batch("FER-3", Some("COS-1"), 2, 40),
    ];
    let forest = Forest::build(flat).unwrap();
    let root = forest.index_of("COS-1").unwrap();
    let ids: Vec<&str> = forest
        .children_of(root)
        .iter()
        .map(|&child| forest.get(child).unwrap().id.as_str())
        .collect();
    assert_eq!(ids, vec!["FER-1", "FER-2", "FER-3"]);
}

#[test]
fn forest_rejects_duplicate_and_unknown_parent() {
    let err = Forest::build(vec![batch("COS-1", None, 1, 10), batch("COS-1", None, 1, 20)])
        .unwrap_err();
    assert_eq!(
        err,
        ForestError::DuplicateId {
            id: "COS-1".to_string()
        }
    );

    let err = Forest::build(vec![batch("FER-1", Some("COS-9"), 2, 10)]).unwrap_err();
    assert_eq!(
        err,
        ForestError::UnknownParent {
            id: "FER-1".to_string(),
            parent_id: "COS-9".to_string()
        }
    );

    let err = Forest::build(vec![batch("COS-1", Some("COS-1"), 1, 10)]).unwrap_err();
    assert_eq!(
        err,
        ForestError::SelfParent {
            id: "COS-1".to_string()
        }
    );
}

#[test]
fn forest_into_nodes_nests_recursive_children() {
    let flat = vec![
        batch("COS-1", None, 1, 10),
        batch("FER-1", Some("COS-1"), 2, 20),
        batch("SEC-1", Some("FER-1"), 3, 30),
        batch("SEC-2", Some("FER-1"), 3, 40),
    ];
    let nodes = Forest::build(flat).unwrap().into_nodes();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].batch.id, "COS-1");
    assert_eq!(nodes[0].children.len(), 1);
    assert_eq!(nodes[0].children[0].batch.id, "FER-1");
    let grandchildren: Vec<&str> = nodes[0].children[0]
        .children
        .iter()
        .map(|node| node.batch.id.as_str())
        .collect();
    assert_eq!(grandchildren, vec!["SEC-1", "SEC-2"]);
}

#[test]
fn ancestry_runs_root_to_leaf() {
    let flat = vec![
        batch("COS-1", None, 1, 10),
        batch("FER-1", Some("COS-1"), 2, 20),
        batch("SEC-1", Some("FER-1"), 3, 30),
        batch("TOS-1", Some("SEC-1"), 4, 40),
    ];
    let forest = Forest::build(flat).unwrap();
    let leaf = forest.index_of("TOS-1").unwrap();
    let chain = forest.ancestry(leaf).unwrap();
    let ids: Vec<&str> = chain
        .iter()
        .map(|&index| forest.get(index).unwrap().id.as_str())
        .collect();
    assert_eq!(ids, vec!["COS-1", "FER-1", "SEC-1", "TOS-1"]);

    // Mid-tree nodes trace too, not only true leaves.
    let mid = forest.index_of("FER-1").unwrap();
    let chain = forest.ancestry(mid).unwrap();
    assert_eq!(chain.len(), 2);
}

#[test]
fn ancestry_caps_on_parent_cycle() {
    // A cycle cannot be created through the store, but the walk must still
    // terminate if one ever appears in raw data.
    let a = batch("A-1", Some("B-1"), 1, 10);
    let b = batch("B-1", Some("A-1"), 1, 20);
    let forest = Forest::build(vec![a, b]).unwrap();
    let index = forest.index_of("A-1").unwrap();
    assert!(forest.ancestry(index).is_none());
}

#[test]
fn trace_reverses_walk_and_keys_by_stage_name() {
    let entry = |id: &str, stage: &str, order: u32| TraceEntry {
        batch_id: id.to_string(),
        stage_id: i64::from(order),
        stage_name: stage.to_string(),
        stage_order: order,
        data: BatchData::new(),
        is_locked: false,
        blockchain_hash: None,
        created_at_ms: 0,
    };

    let trace = Trace::from_walk(vec![
        entry("SEC-1", "Secado", 3),
        entry("FER-1", "Fermentación", 2),
        entry("COS-1", "Cosecha", 1),
    ]);
    let names: Vec<&str> = trace
        .entries()
        .iter()
        .map(|e| e.stage_name.as_str())
        .collect();
    assert_eq!(names, vec!["Cosecha", "Fermentación", "Secado"]);

    // Duplicate stage names collapse onto the deepest entry.
    let trace = Trace::from_walk(vec![
        entry("COS-2", "Cosecha", 1),
        entry("COS-1", "Cosecha", 1),
    ]);
    let keyed = trace.stage_keyed();
    assert_eq!(keyed.len(), 1);
    assert_eq!(keyed[0].1.batch_id, "COS-2");
}

#[test]
fn canonical_data_is_deterministic_and_sorted() {
    let mut data = BatchData::new();
    data.insert(
        "pesoSeco".to_string(),
        field(FieldScalar::Number(40.0)),
    );
    data.insert(
        "finca".to_string(),
        FieldValue {
            value: FieldScalar::Text("El Mirador".to_string()),
            visible: false,
            label: Some("Finca".to_string()),
        },
    );

    let first = canonical_data(&data);
    let second = canonical_data(&data);
    assert_eq!(first, second);
    assert_eq!(
        first,
        r#"{"finca":{"label":"Finca","value":"El Mirador","visible":false},"pesoSeco":{"label":null,"value":40,"visible":true}}"#
    );
}

#[test]
fn canonical_numbers_drop_integral_decimal_point() {
    let mut data = BatchData::new();
    data.insert("a".to_string(), field(FieldScalar::Number(100.0)));
    data.insert("b".to_string(), field(FieldScalar::Number(2.5)));
    let out = canonical_data(&data);
    assert!(out.contains(r#""a":{"label":null,"value":100,"#));
    assert!(out.contains(r#""b":{"label":null,"value":2.5,"#));
}

#[test]
fn canonical_escapes_strings() {
    let mut data = BatchData::new();
    data.insert(
        "nota".to_string(),
        field(FieldScalar::Text("line\none \"two\"\t\u{0007}".to_string())),
    );
    let out = canonical_data(&data);
    assert!(out.contains(r#"line\none \"two\"\t"#));
}

#[test]
fn seal_payload_binds_parent_hash_and_id() {
    let mut data = BatchData::new();
    data.insert("pesoSeco".to_string(), field(FieldScalar::Number(40.0)));

    let base = seal_payload(&data, "", "FER-1");
    assert!(base.starts_with(SEAL_DOMAIN_V1));
    assert!(base.ends_with("\n\nFER-1"));

    let chained = seal_payload(&data, "abc123", "FER-1");
    assert_ne!(base, chained);

    let other_id = seal_payload(&data, "abc123", "FER-2");
    assert_ne!(chained, other_id);
}

#[test]
fn batch_id_validation() {
    assert_eq!(BatchId::try_new("").unwrap_err(), BatchIdError::Empty);
    assert_eq!(
        BatchId::try_new("-COS").unwrap_err(),
        BatchIdError::InvalidFirstChar
    );
    assert!(matches!(
        BatchId::try_new("COS 1").unwrap_err(),
        BatchIdError::InvalidChar { ch: ' ', .. }
    ));
    assert!(BatchId::try_new("COS-0000001A").is_ok());
}

#[test]
fn batch_id_derivation_uses_stage_prefix() {
    assert_eq!(derive_batch_id("Cosecha", 1), "COS-00000001");
    assert_eq!(derive_batch_id("Fermentación", 26), "FER-0000001A");
    assert_eq!(derive_batch_id("秤量", 2), "LOT-00000002");
    assert_eq!(derive_batch_id("Té", 3), "T-00000003");
}
