use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use vox_shared::constants::THREAD_PAGE_SIZE;
use vox_shared::validation::validate_recipient;

use crate::models::{into_messages, AuthUser, MessageRow, MESSAGE_SELECT};
use crate::routes::{database_error, error_response};
use crate::AppState;

#[derive(Deserialize)]
pub struct ThreadQuery {
    pub limit: Option<i64>,
}

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> impl IntoResponse {
    let sql = format!("{} WHERE m.sender_id = ? OR m.receiver_id = ?", MESSAGE_SELECT);
    let rows = sqlx::query_as::<_, MessageRow>(&sql)
        .bind(&user.id)
        .bind(&user.id)
        .fetch_all(&state.db)
        .await;

    match rows {
        Ok(rows) => {
            let messages = into_messages(rows);
            Json(vox_shared::aggregate(&messages, &user.id)).into_response()
        }
        Err(e) => database_error("Failed to list conversations", e),
    }
}

/// GET /api/conversations/:userId/messages
///
/// The most recent page of the thread with one counterparty, oldest first.
pub async fn list_thread(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(counterparty_id): Path<String>,
    Query(query): Query<ThreadQuery>,
) -> impl IntoResponse {
    if let Err(e) = validate_recipient(&user.id, &counterparty_id) {
        return error_response(StatusCode::BAD_REQUEST, e);
    }

    let limit = query
        .limit
        .unwrap_or(THREAD_PAGE_SIZE)
        .clamp(1, THREAD_PAGE_SIZE);

    let sql = format!(
        "{} WHERE (m.sender_id = ? AND m.receiver_id = ?) OR (m.sender_id = ? AND m.receiver_id = ?)
         ORDER BY m.created_at DESC, m.id DESC LIMIT ?",
        MESSAGE_SELECT
    );
    let rows = sqlx::query_as::<_, MessageRow>(&sql)
        .bind(&user.id)
        .bind(&counterparty_id)
        .bind(&counterparty_id)
        .bind(&user.id)
        .bind(limit)
        .fetch_all(&state.db)
        .await;

    match rows {
        Ok(rows) => {
            let mut messages = into_messages(rows);
            messages.reverse();
            Json(messages).into_response()
        }
        Err(e) => database_error("Failed to load thread", e),
    }
}
