use anyhow::Result;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use uuid::Uuid;

use crate::{db::DBLayer, model::session::AdminSession};

pub const SESSION_COOKIE: &str = "admin_session";

/// Sessions live for 12 hours; after that the cookie token stops
/// validating and the admin has to log in again.
const SESSION_TTL_SECS: i64 = 60 * 60 * 12;

pub async fn start_session(db: &DBLayer) -> Result<AdminSession> {
    let now = chrono::Utc::now().timestamp();
    let session = AdminSession {
        token: Uuid::new_v4().to_string(),
        created_ts: now,
        expires_ts: now + SESSION_TTL_SECS,
    };
    db.save_session(&session).await?;
    Ok(session)
}

/// Resolve the cookie jar to a live session, if any. A store error while
/// validating counts as anonymous rather than failing the request.
pub async fn authenticate(db: &DBLayer, jar: &CookieJar) -> Option<AdminSession> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    db.load_session(&token).await.ok().flatten()
}

pub fn session_cookie(session: &AdminSession) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .build()
}

/// Name+path stub handed to `CookieJar::remove` so the browser drops the
/// cookie on logout.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .build()
}
