use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use vox_shared::constants::SESSION_COOKIE_NAME;

use crate::models::AuthUser;
use crate::AppState;

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

/// Session token from `Authorization: Bearer` or the session cookie.
fn session_token(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    if let Some(token) = bearer.filter(|t| !t.is_empty()) {
        return Some(token);
    }

    let cookie_header = parts
        .headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?;
    let prefix = format!("{}=", SESSION_COOKIE_NAME);
    cookie_header
        .split(';')
        .filter_map(|c| c.trim().strip_prefix(prefix.as_str()))
        .find(|t| !t.is_empty())
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts) else {
            return Err(unauthorized("Not authenticated"));
        };

        let row = sqlx::query_as::<_, (String, String, String)>(
            r#"SELECT u.id, u.name, s.expires_at
               FROM "sessions" s
               JOIN "users" u ON u.id = s.user_id
               WHERE s.token = ?"#,
        )
        .bind(token)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            tracing::error!("Session lookup failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Database error"})),
            )
                .into_response()
        })?;

        let Some((user_id, name, expires_at)) = row else {
            return Err(unauthorized("Invalid session"));
        };

        let now = crate::db::now_timestamp();
        if expires_at < now {
            return Err(unauthorized("Session expired"));
        }

        Ok(AuthUser { id: user_id, name })
    }
}
