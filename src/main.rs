use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod admin;
mod api;
mod auth;
mod db;
mod model;
mod push;
mod state;
mod version;

use db::DBLayer;
use push::PushService;
use state::AppState;

const DEFAULT_ADMIN_PASSWORD: &str = "123456";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🚀 Starting mobconfig server...");

    // -----------------------------
    // Shared state / Dependencies
    // -----------------------------
    let db_path = dotenvy::var("DATABASE_PATH").unwrap_or_else(|_| "mobconfig-db".to_string());
    let db = Arc::new(DBLayer::new(&db_path)?);

    // Settings must exist before the first request is served.
    let seed_password =
        dotenvy::var("ADMIN_PASSWORD").unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());
    db.init_settings_if_absent(&seed_password).await?;

    let push = PushService::from_env();
    if push.is_none() {
        tracing::warn!("FCM_SERVER_KEY not set; notification broadcasts will fail");
    }

    let state = AppState { db, push };

    // -----------------------------
    // Routers
    // -----------------------------
    let app = Router::new()
        // Device handshake API
        .merge(api::router())
        // Admin panel (login, dashboard, broadcast)
        .merge(admin::router())
        // CORS for the mobile clients
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        // Attach shared state
        .with_state(state);

    let addr = dotenvy::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    println!("🌐 HTTP listening on http://{addr}");
    println!("📱 Handshake API at http://{addr}/api/handshake");
    println!("🛠 Admin panel at http://{addr}/admin");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
