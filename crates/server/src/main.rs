use std::sync::Arc;
use tokio::net::TcpListener;
use axum::http::{HeaderName, Method};
use tower_http::cors::CorsLayer;

use vox_server::{config::Config, db, routes, AppState};
use vox_shared::constants::APP_NAME;
use vox_shared::Moderator;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vox_server=info".into()),
        )
        .init();

    let config = Config::from_env();

    let pool = match db::init_pool(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to initialize database at {}: {}", config.database_path, e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState {
        db: pool,
        moderator: Moderator::default(),
    });

    let app = routes::build_router(state).layer(
        CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::mirror_request())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                HeaderName::from_static("content-type"),
                HeaderName::from_static("cookie"),
                HeaderName::from_static("authorization"),
            ])
            .allow_credentials(true),
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("{} server running on {}", APP_NAME, addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
