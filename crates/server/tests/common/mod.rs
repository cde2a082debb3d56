#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use chrono::{Duration, SecondsFormat, TimeZone, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;
use vox_server::{db, routes, AppState};
use vox_shared::Moderator;

/// Create an in-memory SQLite pool with schema applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    db::apply_schema(&pool).await.expect("Failed to apply schema");

    pool
}

/// Build a test Axum app with the given pool.
pub fn create_test_app(pool: SqlitePool) -> Router {
    let state = Arc::new(AppState {
        db: pool,
        moderator: Moderator::default(),
    });

    routes::build_router(state)
}

pub fn auth_header(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        format!("Bearer {}", token).parse().unwrap(),
    )
}

/// Create a test user directly in the database. Returns (user_id, session_token).
pub async fn create_test_user(pool: &SqlitePool, email: &str, name: &str, role: &str) -> (String, String) {
    let user_id = uuid::Uuid::new_v4().to_string();
    let now = db::now_timestamp();

    sqlx::query(
        r#"INSERT INTO "users" (id, name, email, profile_image, role, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&user_id)
    .bind(name)
    .bind(email)
    .bind(format!("https://cdn.test/{}.png", name))
    .bind(role)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    let session_token = uuid::Uuid::new_v4().to_string();
    let expires_at = (Utc::now() + Duration::days(30)).to_rfc3339_opts(SecondsFormat::Millis, true);

    sqlx::query(
        r#"INSERT INTO "sessions" (id, user_id, token, expires_at, created_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&user_id)
    .bind(&session_token)
    .bind(&expires_at)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    (user_id, session_token)
}

/// Insert a session that has already expired. Returns the token.
pub async fn create_expired_session(pool: &SqlitePool, user_id: &str) -> String {
    let token = uuid::Uuid::new_v4().to_string();
    let expired = (Utc::now() - Duration::hours(1)).to_rfc3339_opts(SecondsFormat::Millis, true);
    sqlx::query(
        r#"INSERT INTO "sessions" (id, user_id, token, expires_at, created_at) VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(&token)
    .bind(&expired)
    .bind(&expired)
    .execute(pool)
    .await
    .unwrap();
    token
}

/// Insert a message `minutes` after a fixed base time. Returns its id.
pub async fn insert_message(
    pool: &SqlitePool,
    sender_id: &str,
    receiver_id: &str,
    content: &str,
    minutes: i64,
    is_read: bool,
) -> i64 {
    let created_at = (Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes))
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    sqlx::query(
        r#"INSERT INTO "messages" (sender_id, receiver_id, content, created_at, is_read)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .bind(content)
    .bind(&created_at)
    .bind(is_read)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn is_read(pool: &SqlitePool, id: i64) -> bool {
    sqlx::query_as::<_, (bool,)>(r#"SELECT is_read FROM "messages" WHERE id = ?"#)
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
        .0
}
