use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use vox_shared::models::ModerationCheckRequest;

use crate::models::AuthUser;
use crate::AppState;

/// POST /api/moderation/check
///
/// Lets a client preview how a draft will be treated before sending it.
pub async fn check(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(body): Json<ModerationCheckRequest>,
) -> impl IntoResponse {
    Json(state.moderator.classify(&body.content))
}
