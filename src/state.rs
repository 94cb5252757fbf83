use std::sync::Arc;

use crate::{db::DBLayer, push::PushService};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DBLayer>,
    /// Absent when FCM_SERVER_KEY is not configured; broadcasts then
    /// surface an error to the admin instead of silently doing nothing.
    pub push: Option<PushService>,
}
