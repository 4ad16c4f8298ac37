// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the HTTP ingress over a fully wired engine
//! (real SQLite store, scripted LLM and backend doubles).

use std::sync::Arc;

use plantao_config::model::EngineConfig;
use plantao_engine::Engine;
use plantao_gateway::{build_router, GatewayState};
use plantao_store::SqliteStore;
use plantao_test_utils::{confirmed_schedule, pending_schedule, MockBackend, MockLlm};

async fn spawn_server(llm: MockLlm, backend: MockBackend) -> (String, Arc<MockBackend>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let backend = Arc::new(backend);
    let engine = Arc::new(Engine::new(
        store,
        Arc::new(llm),
        backend.clone(),
        EngineConfig::default(),
    ));
    let router = build_router(GatewayState { engine });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), backend)
}

fn ingest_body(message_id: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "message_id": message_id,
        "phoneNumber": "+5511999999999",
        "text": text,
    })
}

#[tokio::test]
async fn healthz_and_readyz_respond() {
    let (base, _backend) = spawn_server(MockLlm::new(), MockBackend::new()).await;
    let client = reqwest::Client::new();

    let health = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(health.status(), 200);
    let body: serde_json::Value = health.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let ready = client.get(format!("{base}/readyz")).send().await.unwrap();
    assert_eq!(ready.status(), 200);
    let body: serde_json::Value = ready.json().await.unwrap();
    assert_eq!(body["ready"], true);
    assert_eq!(body["checks"]["persistence"], true);
}

#[tokio::test]
async fn ingest_walks_the_attendance_flow() {
    let (base, backend) = spawn_server(
        MockLlm::new(),
        MockBackend::new().with_schedule(pending_schedule()),
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/webhook/ingest"))
        .json(&ingest_body("m1", "cheguei"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["outcomeCode"], "escala_staged");
    assert_eq!(body["sessionId"], "5511999999999");
    assert_eq!(body["status"], "success");

    backend.set_schedule(confirmed_schedule());
    let response = client
        .post(format!("{base}/webhook/ingest"))
        .json(&ingest_body("m2", "sim"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["outcomeCode"], "escala_confirmed");
    assert_eq!(backend.schedule_update_count(), 1);
}

#[tokio::test]
async fn idempotency_key_replays_identical_body() {
    let (base, backend) = spawn_server(
        MockLlm::new(),
        MockBackend::new().with_schedule(pending_schedule()),
    )
    .await;
    let client = reqwest::Client::new();
    let url = format!("{base}/webhook/ingest");

    let first = client
        .post(&url)
        .header("X-Idempotency-Key", "k-42")
        .json(&ingest_body("m1", "cheguei"))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);
    assert!(first.headers().get("x-idempotency-replay").is_none());
    let first_body = first.text().await.unwrap();
    let side_effects = backend.calls().len();

    let second = client
        .post(&url)
        .header("X-Idempotency-Key", "k-42")
        .json(&ingest_body("m1", "cheguei"))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 200);
    assert_eq!(
        second
            .headers()
            .get("x-idempotency-replay")
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
    let second_body = second.text().await.unwrap();

    assert_eq!(first_body, second_body, "replayed body must be byte-identical");
    assert_eq!(backend.calls().len(), side_effects, "no repeated backend work");
}

#[tokio::test]
async fn template_fired_merges_hints() {
    let (base, _backend) = spawn_server(
        MockLlm::new(),
        MockBackend::new().with_schedule(confirmed_schedule()),
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/hooks/template-fired"))
        .json(&serde_json::json!({
            "phoneNumber": "+5511999999999",
            "template": "finalizacao_plantao",
            "metadata": { "finishReminderSent": true }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["state_updated"], true);

    // The finish gate now routes everything to finalization.
    let response = client
        .post(format!("{base}/webhook/ingest"))
        .json(&ingest_body("m1", "PA 120x80"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["outcomeCode"], "finalize_topic_collected");
}

#[tokio::test]
async fn malformed_phone_is_rejected_with_400() {
    let (base, _backend) = spawn_server(MockLlm::new(), MockBackend::new()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/webhook/ingest"))
        .json(&serde_json::json!({
            "message_id": "m1",
            "phoneNumber": "not-a-phone",
            "text": "oi"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
