// HTTP request handlers
use crate::application::chat_service::ChatReply;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub query: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub reply: ChatReply,
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

async fn error_response(status: StatusCode, message: &str, compress: bool) -> Response {
    respond(status, &json!({ "error": message }), compress).await
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Answer one chat turn, creating the session when no id is given
pub async fn chat(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let compress = accepts_brotli(&headers);

    let query = request.query.trim();
    if query.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Query must not be empty", compress).await;
    }

    let session_id = request
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let session = state.sessions.get_or_create(&session_id).await;
    let mut session = session.lock().await;

    match state.chat_service.handle(&mut session, query).await {
        Ok(reply) => respond(StatusCode::OK, &ChatResponse { session_id, reply }, compress).await,
        Err(e) => {
            tracing::error!("Error answering query in session {}: {:#}", session_id, e);
            error_response(StatusCode::BAD_GATEWAY, &format!("{:#}", e), compress).await
        }
    }
}

/// Conversation history of one session
pub async fn get_session(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.sessions.get(&id).await {
        Some(session) => {
            let session = session.lock().await;
            respond(StatusCode::OK, &*session, compress).await
        }
        None => error_response(StatusCode::NOT_FOUND, "Session not found", compress).await,
    }
}

/// Run the tolerant parser over a raw backend response body
pub async fn parse_response(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    body: String,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.chat_service.parser().parse(&body) {
        Some(spec) => respond(StatusCode::OK, &spec, compress).await,
        None => error_response(StatusCode::NOT_FOUND, "No chart data found", compress).await,
    }
}

pub async fn list_dashboards(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);
    match state.dashboard_service.list().await {
        Ok(entries) => respond(StatusCode::OK, &entries, compress).await,
        Err(e) => {
            tracing::error!("Error listing dashboards: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not list dashboards", compress).await
        }
    }
}

pub async fn dashboard_stats(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);
    match state.dashboard_service.stats().await {
        Ok(stats) => respond(StatusCode::OK, &stats, compress).await,
        Err(e) => {
            tracing::error!("Error computing dashboard stats: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not compute stats", compress).await
        }
    }
}

pub async fn delete_dashboard(
    Path(index): Path<usize>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.dashboard_service.remove(index).await {
        Ok(Some(entry)) => respond(StatusCode::OK, &entry, compress).await,
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Invalid dashboard index", compress).await,
        Err(e) => {
            tracing::error!("Error removing dashboard {}: {:#}", index, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not remove dashboard", compress).await
        }
    }
}

pub async fn clear_dashboards(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);
    match state.dashboard_service.clear().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Error clearing dashboards: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not clear dashboards", compress).await
        }
    }
}
