//! HTTP request handlers

use super::AppState;
use crate::telegram::Update;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the webhook router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health).post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "Bot is running"
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    if !is_json(&headers) {
        tracing::warn!("Webhook call without JSON content type");
        return (StatusCode::BAD_REQUEST, "unsupported");
    }

    // Telegram redelivers on non-2xx, so undecodable updates are acknowledged
    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            tracing::debug!(update_id = update.update_id, "Update received");
            state.handler.handle_update(update).await;
        }
        Err(e) => tracing::warn!(error = %e, bytes = body.len(), "Undecodable update ignored"),
    }

    (StatusCode::OK, "ok")
}
