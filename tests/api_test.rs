mod helpers;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use neurovault::config::NeuroVaultConfig;
use neurovault::server::{routes, AppState};
use neurovault::validation::queue::{drain_pending, ValidationJob};
use tokio::sync::mpsc::UnboundedReceiver;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let parsed = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse response body as json")
    };
    (status, parsed)
}

fn app() -> (Router, AppState, UnboundedReceiver<ValidationJob>) {
    let (state, rx) = helpers::test_state(NeuroVaultConfig::default());
    (routes::router(state.clone()), state, rx)
}

async fn create(app: &Router, body: Value) -> i64 {
    let (status, parsed) = send(app, "POST", "/memories", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    parsed["id"].as_i64().expect("id")
}

#[tokio::test]
async fn health_and_embed() {
    let (app, _, _rx) = app();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (_, body) = send(&app, "POST", "/embed", Some(json!({"text": "hello world"}))).await;
    let embedding = body["embedding"].as_array().expect("array");
    assert_eq!(embedding.len(), 8);
    assert!((embedding[0].as_f64().unwrap() - 0.4476844434271763).abs() < 1e-12);
}

#[tokio::test]
async fn create_resolves_legacy_fields() {
    let (app, _, _rx) = app();
    let id = create(
        &app,
        json!({
            "ipfs_cid": "QmTest123",
            "cid": "ignored",
            "content_hash": format!("0x{}", "a".repeat(64)),
            "title": "Test Memory",
            "category": "history",
            "submitter": format!("0x{}", "b".repeat(40)),
        }),
    )
    .await;

    let (status, body) = send(&app, "GET", &format!("/memories/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let memory = &body["memory"];
    assert_eq!(memory["cid"], "QmTest123");
    assert_eq!(memory["agent"], format!("0x{}", "b".repeat(40)));
    assert_eq!(memory["content_hash"], format!("0x{}", "a".repeat(64)));
    assert_eq!(memory["summary"], "");
    assert_eq!(memory["status"], "PENDING_VALIDATION");
    assert_eq!(body["validations"], json!([]));
}

#[tokio::test]
async fn create_defaults_agent_and_category() {
    let (app, _, _rx) = app();
    let id = create(&app, json!({"summary": "s"})).await;
    let (_, body) = send(&app, "GET", &format!("/memories/{id}"), None).await;
    assert_eq!(body["memory"]["agent"], "web-ui");
    assert_eq!(body["memory"]["category"], "general");
}

#[tokio::test]
async fn missing_memory_is_404_json() {
    let (app, _, _rx) = app();
    let (status, body) = send(&app, "GET", "/memories/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn list_filters_and_orders_newest_first() {
    let (app, _, _rx) = app();
    let first = create(&app, json!({"agent": "alice", "summary": "a", "category": "art"})).await;
    let second = create(&app, json!({"agent": "bob", "summary": "b"})).await;

    let (_, body) = send(&app, "GET", "/memories", None).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first]);

    let (_, body) = send(&app, "GET", "/memories?category=art", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/memories?limit=1&offset=1", None).await;
    assert_eq!(body[0]["id"], first);

    let (_, body) = send(&app, "GET", "/agent/bob", None).await;
    assert_eq!(body[0]["id"], second);

    let (status, body) = send(&app, "GET", "/memories?status=LOCKED", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn direct_verdict_with_aliases_updates_status() {
    let (app, _, _rx) = app();
    let id = create(&app, json!({"title": "t", "summary": "s"})).await;

    let (status, body) = send(
        &app,
        "POST",
        "/validate",
        Some(json!({
            "memory_id": id,
            "is_valid": true,
            "score": 850,
            "explanation": "Auto-decided",
            "validator": "0xvalidator",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (_, body) = send(&app, "GET", &format!("/memories/{id}"), None).await;
    assert_eq!(body["memory"]["status"], "PASSED");
    assert_eq!(body["validations"][0]["score"], 850.0);
    assert_eq!(body["validations"][0]["reason"], "Auto-decided");

    let (_, body) = send(&app, "GET", &format!("/validations?memoryId={id}"), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn aggregate_tracks_verdicts_and_unvalidated_backlog() {
    let (app, _, _rx) = app();
    let settled = create(&app, json!({"title": "a", "summary": "one"})).await;
    let pending = create(&app, json!({"title": "b", "summary": "two"})).await;

    for (score, valid) in [(10, true), (11, true), (30, false)] {
        let (status, _) = send(
            &app,
            "POST",
            "/validate",
            Some(json!({"memory_id": settled, "score": score, "valid": valid})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, "GET", &format!("/memories/{settled}"), None).await;
    assert_eq!(body["memory"]["validation_count"], 3);
    assert_eq!(body["memory"]["avg_score"], 16.0);
    assert_eq!(body["memory"]["validated"], true);
    assert_eq!(body["memory"]["status"], "FAILED");

    let (status, body) = send(&app, "GET", "/memories/unvalidated", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![pending]);
}

#[tokio::test]
async fn direct_verdict_for_unknown_memory_is_404() {
    let (app, _, _rx) = app();
    let (status, _) = send(
        &app,
        "POST",
        "/validate",
        Some(json!({"memory_id": 77, "valid": false, "score": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/validations", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn trigger_is_enqueued_then_applied() {
    let (app, state, mut rx) = app();
    let id = create(&app, json!({"title": "", "summary": "abcdefghij"})).await;

    // score without valid still counts as a trigger
    let (status, body) = send(
        &app,
        "POST",
        "/validate",
        Some(json!({"memory_id": id, "score": 999})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"enqueued": true}));

    let (_, body) = send(&app, "GET", &format!("/memories/{id}"), None).await;
    assert_eq!(body["memory"]["status"], "PENDING_VALIDATION");

    {
        let mut conn = state.db.lock().unwrap();
        assert_eq!(drain_pending(&mut conn, &mut rx), 1);
    }

    let (_, body) = send(&app, "GET", &format!("/memories/{id}"), None).await;
    assert_eq!(body["memory"]["status"], "FAILED");
    assert_eq!(body["validations"][0]["validator"], "trigger");
    assert_eq!(body["validations"][0]["score"], 2.0);
}

#[tokio::test]
async fn validate_on_create_enqueues_sync_job() {
    let mut config = NeuroVaultConfig::default();
    config.validation.validate_on_create = true;
    let (state, mut rx) = helpers::test_state(config);
    let app = routes::router(state.clone());

    let id = create(&app, json!({"summary": helpers::passing_summary()})).await;
    {
        let mut conn = state.db.lock().unwrap();
        assert_eq!(drain_pending(&mut conn, &mut rx), 1);
    }

    let (_, body) = send(&app, "GET", &format!("/memories/{id}"), None).await;
    assert_eq!(body["memory"]["status"], "PASSED");
    assert_eq!(body["validations"][0]["validator"], "internal-sync");
}

#[tokio::test]
async fn similar_ranks_identical_text_first() {
    let (app, _, _rx) = app();
    create(&app, json!({"title": "A", "summary": "alpha"})).await;
    let target = create(&app, json!({"title": "T", "summary": "test"})).await;

    let (status, body) = send(&app, "GET", "/similar?q=test", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], target);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/similar?q=test&limit=1", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn stats_report_status_counts_and_agents() {
    let (app, _, _rx) = app();
    let id = create(&app, json!({"agent": "0xabc", "summary": "s"})).await;
    create(&app, json!({"agent": "0xabc", "summary": "s"})).await;
    send(
        &app,
        "POST",
        "/validate",
        Some(json!({"memory_id": id, "valid": true, "score": 400, "validator": "0xval"})),
    )
    .await;

    let (_, body) = send(&app, "GET", "/stats", None).await;
    assert_eq!(body["total_memories"], 2);
    assert_eq!(body["by_status"]["PASSED"], 1);
    assert_eq!(body["by_status"]["PENDING_VALIDATION"], 1);
    assert_eq!(body["duplicate_groups"], 1);

    let (_, body) = send(&app, "GET", "/agent/0xabc/stats", None).await;
    assert_eq!(body["submission_count"], 2);

    let (_, body) = send(&app, "GET", "/agent/0xval/stats", None).await;
    assert_eq!(body["validation_count"], 1);
    assert_eq!(body["avg_validation_score"], 400);
}
