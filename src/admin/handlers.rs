use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    admin::{
        session::{
            authenticate, removal_cookie, session_cookie, start_session, SESSION_COOKIE,
        },
        templates::{render_dashboard, render_login, DashboardContext, LoginContext},
    },
    auth::verify_password,
    model::settings::SettingsUpdate,
    push::broadcast_to_all,
    state::AppState,
};

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub app_text: String,
    #[serde(default)]
    pub v2ray_configs: String,
    #[serde(default)]
    pub deprecated_version: String,
    /// Checkbox: present when ticked, absent otherwise.
    #[serde(default)]
    pub force_update: Option<String>,
}

#[derive(Deserialize)]
pub struct NotifyForm {
    #[serde(default)]
    pub notif_title: String,
    #[serde(default)]
    pub notif_body: String,
}

pub async fn index() -> Redirect {
    Redirect::to("/admin/login")
}

pub async fn login_page() -> Result<Html<String>, (StatusCode, String)> {
    render_login(&LoginContext { error: None })
        .map(Html)
        .map_err(render_error)
}

pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, (StatusCode, String)> {
    let settings = state.db.load_settings().await.map_err(internal_error)?;

    let valid =
        verify_password(&settings.admin_password_hash, &form.password).map_err(internal_error)?;

    if !valid {
        warn!("admin login rejected");
        let page = render_login(&LoginContext {
            error: Some("Wrong password"),
        })
        .map_err(render_error)?;
        return Ok(Html(page).into_response());
    }

    let session = start_session(&state.db).await.map_err(internal_error)?;
    info!("admin session opened");
    Ok((jar.add(session_cookie(&session)), Redirect::to("/admin")).into_response())
}

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, (StatusCode, String)> {
    if authenticate(&state.db, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    render_dashboard_page(&state, None).await
}

pub async fn save_settings(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SettingsForm>,
) -> Result<Response, (StatusCode, String)> {
    if authenticate(&state.db, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    let update = SettingsUpdate {
        app_text: form.app_text,
        v2ray_configs: form.v2ray_configs,
        deprecated_version: form.deprecated_version,
        force_update: form.force_update.is_some(),
    };
    state
        .db
        .update_settings(&update)
        .await
        .map_err(internal_error)?;
    info!("settings updated");

    render_dashboard_page(&state, Some("Settings saved".to_string())).await
}

pub async fn send_notification(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<NotifyForm>,
) -> Result<Response, (StatusCode, String)> {
    if authenticate(&state.db, &jar).await.is_none() {
        return Ok(Redirect::to("/admin/login").into_response());
    }

    if form.notif_title.is_empty() || form.notif_body.is_empty() {
        return render_dashboard_page(&state, Some("Title and body are required".to_string()))
            .await;
    }

    let flash = match broadcast_to_all(
        &state.db,
        state.push.as_ref(),
        &form.notif_title,
        &form.notif_body,
    )
    .await
    {
        Ok(count) => format!("Notification sent to {count} devices"),
        Err(err) => {
            error!(?err, "broadcast failed");
            "Failed to send notification, check server logs".to_string()
        }
    };

    render_dashboard_page(&state, Some(flash)).await
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, (StatusCode, String)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state
            .db
            .delete_session(cookie.value())
            .await
            .map_err(internal_error)?;
    }

    Ok((jar.remove(removal_cookie()), Redirect::to("/admin/login")).into_response())
}

async fn render_dashboard_page(
    state: &AppState,
    flash: Option<String>,
) -> Result<Response, (StatusCode, String)> {
    let settings = state.db.load_settings().await.map_err(internal_error)?;
    let device_count = state.db.count_devices().await.map_err(internal_error)?;

    let page = render_dashboard(&DashboardContext {
        app_text: settings.app_text,
        v2ray_configs: settings.v2ray_configs,
        deprecated_version: settings.deprecated_version,
        force_update: settings.force_update,
        device_count,
        flash,
    })
    .map_err(render_error)?;

    Ok(Html(page).into_response())
}

fn internal_error(err: anyhow::Error) -> (StatusCode, String) {
    error!(?err, "admin request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
}

fn render_error(err: minijinja::Error) -> (StatusCode, String) {
    error!(?err, "template rendering failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DBLayer;
    use std::sync::Arc;

    async fn test_state() -> AppState {
        let path =
            std::env::temp_dir().join(format!("mobconfig-admin-test-{}", uuid::Uuid::new_v4()));
        let db = DBLayer::new(path.to_str().unwrap()).unwrap();
        db.init_settings_if_absent("123456").await.unwrap();
        AppState {
            db: Arc::new(db),
            push: None,
        }
    }

    fn is_redirect_to_login(response: &Response) -> bool {
        response.status().is_redirection()
            && response
                .headers()
                .get(axum::http::header::LOCATION)
                .and_then(|l| l.to_str().ok())
                == Some("/admin/login")
    }

    async fn logged_in_jar(state: &AppState) -> CookieJar {
        let session = start_session(&state.db).await.unwrap();
        CookieJar::new().add(session_cookie(&session))
    }

    #[tokio::test]
    async fn correct_password_opens_a_session() {
        let state = test_state().await;

        let response = login_submit(
            State(state.clone()),
            CookieJar::new(),
            Form(LoginForm {
                password: "123456".into(),
            }),
        )
        .await
        .unwrap();

        assert!(response.status().is_redirection());
        assert!(response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .is_some());
    }

    #[tokio::test]
    async fn wrong_password_re_renders_login_without_a_session() {
        let state = test_state().await;

        let response = login_submit(
            State(state.clone()),
            CookieJar::new(),
            Form(LoginForm {
                password: "wrong".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .is_none());
    }

    #[tokio::test]
    async fn dashboard_requires_a_session() {
        let state = test_state().await;

        let anonymous = dashboard(State(state.clone()), CookieJar::new())
            .await
            .unwrap();
        assert!(is_redirect_to_login(&anonymous));

        let jar = logged_in_jar(&state).await;
        let authed = dashboard(State(state), jar).await.unwrap();
        assert_eq!(authed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn save_settings_applies_the_update() {
        let state = test_state().await;
        let jar = logged_in_jar(&state).await;

        save_settings(
            State(state.clone()),
            jar,
            Form(SettingsForm {
                app_text: "hello".into(),
                v2ray_configs: "vless://example".into(),
                deprecated_version: "3.0.0".into(),
                force_update: Some("on".into()),
            }),
        )
        .await
        .unwrap();

        let settings = state.db.load_settings().await.unwrap();
        assert_eq!(settings.app_text, "hello");
        assert_eq!(settings.deprecated_version, "3.0.0");
        assert!(settings.force_update);
    }

    #[tokio::test]
    async fn notify_with_no_registered_tokens_reports_zero() {
        let state = test_state().await;
        let jar = logged_in_jar(&state).await;

        // No devices, push unconfigured: zero-token broadcast still succeeds.
        let response = send_notification(
            State(state),
            jar,
            Form(NotifyForm {
                notif_title: "title".into(),
                notif_body: "body".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn notify_requires_title_and_body() {
        let state = test_state().await;
        let jar = logged_in_jar(&state).await;

        let response = send_notification(
            State(state),
            jar,
            Form(NotifyForm {
                notif_title: "".into(),
                notif_body: "body".into(),
            }),
        )
        .await
        .unwrap();

        // Re-rendered dashboard with an error flash, not a dispatch.
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_invalidates_the_session() {
        let state = test_state().await;
        let session = start_session(&state.db).await.unwrap();
        let jar = CookieJar::new().add(session_cookie(&session));

        logout(State(state.clone()), jar).await.unwrap();

        assert!(state
            .db
            .load_session(&session.token)
            .await
            .unwrap()
            .is_none());
    }
}
