//! Gateway router and handlers.

use super::GatewayConfig;
use crate::chat::ChatService;
use crate::error::ChatError;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self {
            chat: Arc::new(chat),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    chat_id: String,
    message: String,
}

/// Build an axum Router with every chat route, CORS and request tracing.
pub fn router(state: AppState, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/new_chat", post(new_chat_handler))
        .route("/api/list_chats", get(list_chats_handler))
        .route("/api/chat", post(chat_handler))
        .route(
            "/api/history/{chat_id}",
            get(history_handler).delete(delete_history_handler),
        )
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if parsed.is_empty() {
        warn!("No valid CORS origin configured, allowing any origin");
        return cors.allow_origin(Any);
    }
    cors.allow_origin(parsed)
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({ "status": "backend running" }))
}

async fn new_chat_handler() -> impl IntoResponse {
    Json(json!({ "chat_id": ChatService::new_chat_id() }))
}

async fn list_chats_handler(State(state): State<AppState>) -> Response {
    match state.chat.list_chats().await {
        Ok(chats) => Json(json!({ "chats": chats })).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list chats");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn chat_handler(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    match state.chat.handle(&req.chat_id, &req.message).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => chat_error_response(e),
    }
}

async fn history_handler(State(state): State<AppState>, Path(chat_id): Path<String>) -> Response {
    match state.chat.history(&chat_id).await {
        Ok(history) => Json(json!({ "chat_id": chat_id, "history": history })).into_response(),
        Err(e) => chat_error_response(e),
    }
}

async fn delete_history_handler(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Response {
    match state.chat.delete_history(&chat_id).await {
        Ok(removed) => {
            info!(chat_id = %chat_id, removed, "Chat history deleted");
            Json(json!({ "status": "deleted", "chat_id": chat_id })).into_response()
        }
        Err(e) => chat_error_response(e),
    }
}

fn chat_error_response(err: ChatError) -> Response {
    match err {
        ChatError::EmptyMessage => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": err.to_string() })),
        )
            .into_response(),
        ChatError::Store(e) => {
            error!(error = %e, "Transcript store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Start the gateway on the configured address.
///
/// This is an async function that runs until cancelled.
pub async fn run(config: &GatewayConfig, state: AppState) -> Result<(), std::io::Error> {
    let app = router(state, config);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
