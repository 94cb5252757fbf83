use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct HandshakeRequest {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub fcm_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HandshakeResponse {
    pub status: &'static str,
    pub data: HandshakeData,
}

#[derive(Debug, Serialize)]
pub struct HandshakeData {
    pub text: String,
    pub configs: String,
    pub update_needed: bool,
    pub force_update: bool,
    /// The stored `deprecated_version`, exposed to the client as the
    /// authoritative target version.
    pub server_version: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub status: &'static str,
    pub message: &'static str,
}
