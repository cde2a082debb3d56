use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use vox_shared::models::{MarkReadRequest, MarkReadResponse, SendMessageRequest};
use vox_shared::validation::{validate_message_content, validate_read_batch, validate_recipient};
use vox_shared::Action;

use crate::models::{into_messages, AuthUser, MessageRow, MESSAGE_SELECT};
use crate::routes::{database_error, error_response};
use crate::AppState;

/// GET /api/messages
///
/// Every message the caller sent or received, newest first.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> impl IntoResponse {
    let sql = format!(
        "{} WHERE m.sender_id = ? OR m.receiver_id = ? ORDER BY m.created_at DESC, m.id DESC",
        MESSAGE_SELECT
    );
    let rows = sqlx::query_as::<_, MessageRow>(&sql)
        .bind(&user.id)
        .bind(&user.id)
        .fetch_all(&state.db)
        .await;

    match rows {
        Ok(rows) => Json(into_messages(rows)).into_response(),
        Err(e) => database_error("Failed to list messages", e),
    }
}

/// POST /api/messages
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<SendMessageRequest>,
) -> impl IntoResponse {
    if let Err(e) = validate_recipient(&user.id, &body.receiver_id) {
        return error_response(StatusCode::BAD_REQUEST, e);
    }
    if let Err(e) = validate_message_content(&body.content) {
        return error_response(StatusCode::BAD_REQUEST, e);
    }
    let content = body.content.trim();

    let receiver = sqlx::query_as::<_, (String,)>(r#"SELECT id FROM "users" WHERE id = ?"#)
        .bind(&body.receiver_id)
        .fetch_optional(&state.db)
        .await;
    match receiver {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => return database_error("Failed to look up receiver", e),
    }

    let verdict = state.moderator.classify(content);
    match verdict.action {
        Action::Block => {
            tracing::info!("Blocked message from {} ({}): {:?}", user.name, user.id, verdict.warning);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({"error": verdict.warning, "action": verdict.action})),
            )
                .into_response();
        }
        Action::Warn if !body.confirmed => {
            return (
                StatusCode::CONFLICT,
                Json(serde_json::json!({"error": verdict.warning, "action": verdict.action})),
            )
                .into_response();
        }
        Action::Warn | Action::None => {}
    }

    let now = crate::db::now_timestamp();
    let inserted = sqlx::query(
        r#"INSERT INTO "messages" (sender_id, receiver_id, content, created_at, is_read)
           VALUES (?, ?, ?, ?, 0)"#,
    )
    .bind(&user.id)
    .bind(&body.receiver_id)
    .bind(content)
    .bind(&now)
    .execute(&state.db)
    .await;

    let id = match inserted {
        Ok(result) => result.last_insert_rowid(),
        Err(e) => return database_error("Failed to insert message", e),
    };

    let sql = format!("{} WHERE m.id = ?", MESSAGE_SELECT);
    let row = sqlx::query_as::<_, MessageRow>(&sql)
        .bind(id)
        .fetch_one(&state.db)
        .await;

    match row.map(MessageRow::into_message) {
        Ok(Some(message)) => (StatusCode::CREATED, Json(message)).into_response(),
        Ok(None) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load message"),
        Err(e) => database_error("Failed to load inserted message", e),
    }
}

/// POST /api/messages/read
///
/// Only messages addressed to the caller are touched, and a read flag is
/// never cleared.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<MarkReadRequest>,
) -> impl IntoResponse {
    if let Err(e) = validate_read_batch(&body.ids) {
        return error_response(StatusCode::BAD_REQUEST, e);
    }
    if body.ids.is_empty() {
        return Json(MarkReadResponse { updated: 0 }).into_response();
    }

    let placeholders: Vec<&str> = body.ids.iter().map(|_| "?").collect();
    let sql = format!(
        r#"UPDATE "messages" SET is_read = 1
           WHERE receiver_id = ? AND is_read = 0 AND id IN ({})"#,
        placeholders.join(",")
    );
    let mut query = sqlx::query(&sql).bind(&user.id);
    for id in &body.ids {
        query = query.bind(id);
    }

    match query.execute(&state.db).await {
        Ok(result) => Json(MarkReadResponse {
            updated: result.rows_affected(),
        })
        .into_response(),
        Err(e) => database_error("Failed to mark messages read", e),
    }
}
