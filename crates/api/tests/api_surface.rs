use lt_api::{ApiRequest, ApiServer};
use lt_storage::SqliteStore;
use serde_json::{Value, json};

fn server(test_name: &str) -> ApiServer {
    let mut dir = std::env::temp_dir();
    dir.push(format!("lotrace_api_{test_name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    ApiServer::new(SqliteStore::open(&dir).expect("open store"))
}

fn call(server: &mut ApiServer, op: &str, params: Value) -> Value {
    let request: ApiRequest = serde_json::from_value(json!({
        "op": op,
        "id": 1,
        "params": params,
    }))
    .expect("valid request");
    server.handle(request)
}

fn result(reply: &Value) -> &Value {
    reply
        .get("result")
        .unwrap_or_else(|| panic!("expected result, got {reply}"))
}

fn error_code(reply: &Value) -> &str {
    reply
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("expected error, got {reply}"))
}

/// Template with Cosecha/Fermentación stages; returns
/// (template_id, stage_ids).
fn seed_cacao(server: &mut ApiServer) -> (i64, Vec<i64>) {
    let template = call(
        server,
        "template.create",
        json!({ "tenant": "finca-a", "name": "Cacao" }),
    );
    let template_id = result(&template)["id"].as_i64().expect("template id");

    let mut stage_ids = Vec::new();
    for (name, output) in [("Cosecha", "pesoCosecha"), ("Fermentación", "pesoSeco")] {
        let stage = call(
            server,
            "stage.create",
            json!({
                "template_id": template_id,
                "name": name,
                "outputs": [{ "name": output, "label": name, "kind": "number" }],
                "primary_output_field": output,
            }),
        );
        stage_ids.push(result(&stage)["id"].as_i64().expect("stage id"));
    }
    (template_id, stage_ids)
}

#[test]
fn ping_answers() {
    let mut server = server("ping");
    let reply = call(&mut server, "ping", json!({}));
    assert_eq!(result(&reply)["ok"], json!(true));
}

#[test]
fn unknown_op_is_invalid_input() {
    let mut server = server("unknown_op");
    let reply = call(&mut server, "batch.transmogrify", json!({}));
    assert_eq!(error_code(&reply), "INVALID_INPUT");
}

#[test]
fn batch_lifecycle_over_the_wire() {
    let mut server = server("lifecycle");
    let (template_id, stage_ids) = seed_cacao(&mut server);

    let root = call(
        &mut server,
        "batch.create",
        json!({
            "tenant": "finca-a",
            "template_id": template_id,
            "stage_id": stage_ids[0],
            "data": { "pesoCosecha": { "value": 100 } },
        }),
    );
    let root_id = result(&root)["id"].as_str().expect("root id").to_string();
    assert!(root_id.starts_with("COS-"));

    let child = call(
        &mut server,
        "batch.create",
        json!({
            "tenant": "finca-a",
            "template_id": template_id,
            "stage_id": stage_ids[1],
            "parent_id": root_id,
            "data": { "pesoSeco": 40 },
        }),
    );
    let child_id = result(&child)["id"].as_str().expect("child id").to_string();

    let trace = call(
        &mut server,
        "trace.view",
        json!({ "tenant": "finca-a", "batch_id": child_id }),
    );
    let entries = result(&trace)["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["stage"], json!("Cosecha"));
    assert_eq!(entries[0]["data"]["pesoCosecha"]["value"], json!(100.0));
    assert_eq!(entries[1]["stage"], json!("Fermentación"));

    let sealed = call(
        &mut server,
        "batch.seal",
        json!({ "tenant": "finca-a", "batch_id": child_id }),
    );
    assert_eq!(result(&sealed)["is_locked"], json!(true));
    let hash = result(&sealed)["blockchain_hash"]
        .as_str()
        .expect("hash")
        .to_string();
    assert_eq!(hash.len(), 64);

    let update = call(
        &mut server,
        "batch.update",
        json!({
            "tenant": "finca-a",
            "batch_id": child_id,
            "data": { "pesoSeco": 41 },
        }),
    );
    assert_eq!(error_code(&update), "LOCKED");

    let reseal = call(
        &mut server,
        "batch.seal",
        json!({ "tenant": "finca-a", "batch_id": child_id }),
    );
    assert_eq!(error_code(&reseal), "ALREADY_LOCKED");

    let delete = call(
        &mut server,
        "batch.delete_subtree",
        json!({ "tenant": "finca-a", "batch_id": result(&root)["id"] }),
    );
    assert_eq!(error_code(&delete), "LOCKED");
}

#[test]
fn stage_sequence_errors_surface_with_their_code() {
    let mut server = server("sequence_code");
    let (template_id, stage_ids) = seed_cacao(&mut server);

    let reply = call(
        &mut server,
        "batch.create",
        json!({
            "tenant": "finca-a",
            "template_id": template_id,
            "stage_id": stage_ids[1],
        }),
    );
    assert_eq!(error_code(&reply), "INVALID_STAGE_SEQUENCE");
}

#[test]
fn missing_batch_is_not_found() {
    let mut server = server("not_found");
    seed_cacao(&mut server);
    let reply = call(
        &mut server,
        "batch.get",
        json!({ "tenant": "finca-a", "batch_id": "COS-FFFFFFFF" }),
    );
    assert_eq!(error_code(&reply), "NOT_FOUND");
}

#[test]
fn forest_view_nests_children() {
    let mut server = server("forest");
    let (template_id, stage_ids) = seed_cacao(&mut server);

    let root = call(
        &mut server,
        "batch.create",
        json!({
            "tenant": "finca-a",
            "template_id": template_id,
            "stage_id": stage_ids[0],
            "data": { "pesoCosecha": 100 },
        }),
    );
    let root_id = result(&root)["id"].as_str().expect("root id").to_string();
    call(
        &mut server,
        "batch.create",
        json!({
            "tenant": "finca-a",
            "template_id": template_id,
            "stage_id": stage_ids[1],
            "parent_id": root_id,
        }),
    );

    let forest = call(&mut server, "forest.view", json!({ "tenant": "finca-a" }));
    let roots = result(&forest)["roots"].as_array().expect("roots");
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["children"].as_array().expect("children").len(), 1);
}

#[test]
fn trace_view_public_hides_invisible_fields() {
    let mut server = server("public_trace");
    let (template_id, stage_ids) = seed_cacao(&mut server);

    let root = call(
        &mut server,
        "batch.create",
        json!({
            "tenant": "finca-a",
            "template_id": template_id,
            "stage_id": stage_ids[0],
            "data": {
                "pesoCosecha": { "value": 100, "visible": false },
            },
        }),
    );
    let root_id = result(&root)["id"].as_str().expect("root id").to_string();

    let public = call(
        &mut server,
        "trace.view",
        json!({ "tenant": "finca-a", "batch_id": root_id, "public": true }),
    );
    let entries = result(&public)["entries"].as_array().expect("entries");
    assert!(entries[0]["data"].as_object().expect("data").is_empty());

    let internal = call(
        &mut server,
        "trace.view",
        json!({ "tenant": "finca-a", "batch_id": root_id }),
    );
    let entries = result(&internal)["entries"].as_array().expect("entries");
    assert!(!entries[0]["data"].as_object().expect("data").is_empty());
}

#[test]
fn gs1_resolution_reports_existence_and_recall() {
    let mut server = server("gs1");
    let (template_id, stage_ids) = seed_cacao(&mut server);

    let batch = call(
        &mut server,
        "batch.create",
        json!({
            "tenant": "finca-a",
            "template_id": template_id,
            "stage_id": stage_ids[0],
            "status": "recall",
        }),
    );
    let batch_id = result(&batch)["id"].as_str().expect("id").to_string();

    let hit = call(
        &mut server,
        "gs1.resolve",
        json!({ "tenant": "finca-a", "batch_id": batch_id }),
    );
    assert_eq!(result(&hit)["exists"], json!(true));
    assert_eq!(result(&hit)["recall"], json!(true));

    let miss = call(
        &mut server,
        "gs1.resolve",
        json!({ "tenant": "finca-a", "batch_id": "COS-00FF00FF" }),
    );
    assert_eq!(result(&miss)["exists"], json!(false));
    assert_eq!(result(&miss)["recall"], json!(false));
}
