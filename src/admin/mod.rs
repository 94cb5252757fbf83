use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod handlers;
pub mod session;
pub mod templates;

use handlers::{
    dashboard, index, login_page, login_submit, logout, save_settings, send_notification,
};

/// Admin panel router. Everything past the login form requires a valid
/// session cookie; the settings/notify actions are separate endpoints so
/// neither form can trigger the other.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/admin/login", get(login_page).post(login_submit))
        .route("/admin", get(dashboard))
        .route("/admin/settings", post(save_settings))
        .route("/admin/notify", post(send_notification))
        .route("/admin/logout", get(logout))
}
