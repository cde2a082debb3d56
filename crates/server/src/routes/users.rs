use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use vox_shared::UserSummary;

use crate::models::{AuthUser, UserRow};
use crate::routes::{database_error, error_response};
use crate::AppState;

/// GET /api/users/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> impl IntoResponse {
    let row = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, profile_image, role FROM "users" WHERE id = ?"#,
    )
    .bind(&user.id)
    .fetch_optional(&state.db)
    .await;

    match row {
        Ok(Some(row)) => Json(UserSummary::from(row)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => database_error("Failed to load user", e),
    }
}
