use serde::{Deserialize, Serialize};

/// Server-side admin session record. The token doubles as the cookie
/// value; nothing else about the session lives in the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    pub token: String, // UUID
    pub created_ts: i64,
    pub expires_ts: i64,
}

impl AdminSession {
    pub fn is_expired(&self, now_ts: i64) -> bool {
        now_ts >= self.expires_ts
    }
}
