pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod routes;

use vox_shared::Moderator;

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub moderator: Moderator,
}
