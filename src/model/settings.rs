use serde::{Deserialize, Serialize};

pub const DEFAULT_DEPRECATED_VERSION: &str = "1.0.0";

/// App-wide configuration, stored as a single record. Clients below
/// `deprecated_version` are told to update during the handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub app_text: String,
    pub v2ray_configs: String,
    pub deprecated_version: String,
    pub force_update: bool,
    pub admin_password_hash: String, // argon2 PHC string, never plaintext
}

impl AppSettings {
    pub fn with_password_hash(hash: String) -> Self {
        Self {
            app_text: String::new(),
            v2ray_configs: String::new(),
            deprecated_version: DEFAULT_DEPRECATED_VERSION.to_string(),
            force_update: false,
            admin_password_hash: hash,
        }
    }
}

/// The fields the dashboard is allowed to overwrite. The password hash is
/// deliberately not part of this set.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsUpdate {
    pub app_text: String,
    pub v2ray_configs: String,
    pub deprecated_version: String,
    pub force_update: bool,
}
