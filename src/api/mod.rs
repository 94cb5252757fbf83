use axum::{routing::post, Router};

use crate::state::AppState;

pub mod handlers;
pub mod types;

use handlers::handshake;

/// Device-facing API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/handshake", post(handshake))
}
