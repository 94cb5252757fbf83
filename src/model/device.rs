use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String, // client-generated, opaque
    pub current_version: String,
    pub last_seen_ts: i64,
    pub fcm_token: Option<String>,
}
