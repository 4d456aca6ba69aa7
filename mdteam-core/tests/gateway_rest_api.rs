//! Integration tests for the gateway REST API endpoints.

use axum::body::Body;
use mdteam_core::gateway::{AppState, GatewayConfig, gateway_router};
use mdteam_core::{ChatService, MdTeamConfig, MockLlmProvider, TranscriptStore};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn make_app(provider: Arc<MockLlmProvider>, store: TranscriptStore) -> axum::Router {
    let chat = ChatService::from_config(&MdTeamConfig::default(), provider, store);
    gateway_router(AppState::new(chat), &GatewayConfig::default())
}

fn make_request(method: &str, uri: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn make_post_request(uri: &str, body: serde_json::Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn send(
    app: &axum::Router,
    req: axum::http::Request<Body>,
) -> (axum::http::StatusCode, serde_json::Value) {
    let resp = ServiceExt::<axum::http::Request<Body>>::oneshot(app.clone(), req)
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 100_000)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn chat_body(chat_id: &str, message: &str) -> serde_json::Value {
    serde_json::json!({ "chat_id": chat_id, "message": message })
}

// --- / and /api/new_chat ---

#[tokio::test]
async fn test_root_reports_running() {
    let app = make_app(Arc::new(MockLlmProvider::new()), TranscriptStore::open_in_memory().unwrap());
    let (status, json) = send(&app, make_request("GET", "/")).await;
    assert_eq!(status, 200);
    assert_eq!(json, serde_json::json!({ "status": "backend running" }));
}

#[tokio::test]
async fn test_new_chat_returns_fresh_uuid() {
    let app = make_app(Arc::new(MockLlmProvider::new()), TranscriptStore::open_in_memory().unwrap());
    let (status, first) = send(&app, make_request("POST", "/api/new_chat")).await;
    let (_, second) = send(&app, make_request("POST", "/api/new_chat")).await;
    assert_eq!(status, 200);

    let a = first["chat_id"].as_str().unwrap();
    let b = second["chat_id"].as_str().unwrap();
    assert_ne!(a, b);
    assert!(uuid::Uuid::parse_str(a).is_ok());
}

// --- /api/chat ---

#[tokio::test]
async fn test_general_chat_round_trip() {
    let provider = Arc::new(MockLlmProvider::with_responses(["Hello! How can I help?"]));
    let app = make_app(provider.clone(), TranscriptStore::open_in_memory().unwrap());

    let (status, json) = send(&app, make_post_request("/api/chat", chat_body("c1", "hi there"))).await;
    assert_eq!(status, 200);
    assert_eq!(json["reply"], "Hello! How can I help?");
    assert_eq!(json["is_medical"], false);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_medical_chat_uses_team_pipeline() {
    let provider = Arc::new(MockLlmProvider::with_responses([
        "Low",
        "Updated Diagnosis: migraine. Reasoning: photophobia",
        "Final Diagnosis: migraine",
    ]));
    let app = make_app(provider.clone(), TranscriptStore::open_in_memory().unwrap());

    let (status, json) = send(
        &app,
        make_post_request("/api/chat", chat_body("c1", "Throbbing head PAIN with nausea")),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json["is_medical"], true);
    let reply = json["reply"].as_str().unwrap();
    assert!(reply.starts_with("Medical Reasoning (Educational Only)"));
    assert!(reply.contains("Complexity: LOW"));
    assert!(reply.contains("Final Opinion:\nFinal Diagnosis: migraine"));
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_empty_message_rejected_with_detail() {
    let provider = Arc::new(MockLlmProvider::new());
    let app = make_app(provider.clone(), TranscriptStore::open_in_memory().unwrap());

    let (status, json) = send(&app, make_post_request("/api/chat", chat_body("c1", "\n\t "))).await;
    assert_eq!(status, 400);
    assert_eq!(json["detail"], "Message cannot be empty.");
    assert_eq!(provider.call_count(), 0);

    let (_, history) = send(&app, make_request("GET", "/api/history/c1")).await;
    assert_eq!(history["history"].as_array().unwrap().len(), 0);
}

// --- /api/history and /api/list_chats ---

#[tokio::test]
async fn test_history_list_and_delete() {
    let provider = Arc::new(MockLlmProvider::with_response("sure"));
    let app = make_app(provider, TranscriptStore::open_in_memory().unwrap());

    send(&app, make_post_request("/api/chat", chat_body("alpha", "first question"))).await;
    send(&app, make_post_request("/api/chat", chat_body("beta", "another topic"))).await;

    let (status, json) = send(&app, make_request("GET", "/api/history/alpha")).await;
    assert_eq!(status, 200);
    assert_eq!(json["chat_id"], "alpha");
    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[0]["message"], "first question");
    assert_eq!(history[1]["role"], "assistant");
    assert!(history[1]["timestamp"].as_str().unwrap().ends_with('Z'));

    let (status, json) = send(&app, make_request("GET", "/api/list_chats")).await;
    assert_eq!(status, 200);
    let chats = json["chats"].as_array().unwrap();
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0]["id"], "beta");
    assert_eq!(chats[0]["title"], "another topic");

    let (status, json) = send(&app, make_request("DELETE", "/api/history/alpha")).await;
    assert_eq!(status, 200);
    assert_eq!(json, serde_json::json!({ "status": "deleted", "chat_id": "alpha" }));

    let (_, json) = send(&app, make_request("GET", "/api/list_chats")).await;
    assert_eq!(json["chats"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_unknown_chat_still_succeeds() {
    let app = make_app(Arc::new(MockLlmProvider::new()), TranscriptStore::open_in_memory().unwrap());
    let (status, json) = send(&app, make_request("DELETE", "/api/history/nope")).await;
    assert_eq!(status, 200);
    assert_eq!(json["status"], "deleted");
}

#[tokio::test]
async fn test_list_chats_store_failure_is_500() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chats.db");
    let store = TranscriptStore::open(&path).unwrap();
    let app = make_app(Arc::new(MockLlmProvider::new()), store);

    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch("DROP TABLE messages")
        .unwrap();

    let (status, json) = send(&app, make_request("GET", "/api/list_chats")).await;
    assert_eq!(status, 500);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let app = make_app(Arc::new(MockLlmProvider::new()), TranscriptStore::open_in_memory().unwrap());
    let req = axum::http::Request::builder()
        .uri("/")
        .header("origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let resp = ServiceExt::<axum::http::Request<Body>>::oneshot(app, req)
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
