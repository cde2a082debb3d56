pub mod conversations;
pub mod messages;
pub mod moderation;
pub mod users;

use crate::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({"error": message.into()}))).into_response()
}

pub(crate) fn database_error(context: &str, e: sqlx::Error) -> Response {
    tracing::error!("{}: {:?}", context, e);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
}

/// GET /api/health
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        // Users
        .route("/users/me", get(users::get_me))
        // Messages
        .route("/messages", get(messages::list_messages))
        .route("/messages", post(messages::send_message))
        .route("/messages/read", post(messages::mark_read))
        // Conversations
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations/{userId}/messages", get(conversations::list_thread))
        // Moderation
        .route("/moderation/check", post(moderation::check));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
}
