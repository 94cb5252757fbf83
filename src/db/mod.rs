use anyhow::{anyhow, Result};
use rocksdb::{Direction, IteratorMode, Options, DB};

use crate::{
    auth::hash_password,
    model::{
        device::Device,
        session::AdminSession,
        settings::{AppSettings, SettingsUpdate},
    },
};

use std::str;

const SETTINGS_KEY: &str = "settings";

pub struct DBLayer {
    db: DB,
}

impl DBLayer {
    pub fn new(path: &str) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }

    // ============================================================
    // SETTINGS (singleton record)
    // ============================================================

    /// Seed the settings record on first start. Idempotent: an existing
    /// record is left untouched, so a restart never resets the panel.
    pub async fn init_settings_if_absent(&self, default_password: &str) -> Result<()> {
        if self.db.get(SETTINGS_KEY)?.is_some() {
            return Ok(());
        }
        let hash = hash_password(default_password)?;
        let settings = AppSettings::with_password_hash(hash);
        self.db.put(SETTINGS_KEY, serde_json::to_vec(&settings)?)?;
        Ok(())
    }

    pub async fn load_settings(&self) -> Result<AppSettings> {
        let raw = self
            .db
            .get(SETTINGS_KEY)?
            .ok_or_else(|| anyhow!("settings record missing; seed did not run"))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Overwrite the dashboard-editable fields. The password hash rides
    /// along unchanged.
    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<AppSettings> {
        let mut settings = self.load_settings().await?;
        settings.app_text = update.app_text.clone();
        settings.v2ray_configs = update.v2ray_configs.clone();
        settings.deprecated_version = update.deprecated_version.clone();
        settings.force_update = update.force_update;
        self.db.put(SETTINGS_KEY, serde_json::to_vec(&settings)?)?;
        Ok(settings)
    }

    // ============================================================
    // DEVICE REGISTRY
    // ============================================================
    fn device_key(device_id: &str) -> String {
        format!("device:{device_id}")
    }

    pub async fn load_device(&self, device_id: &str) -> Result<Option<Device>> {
        Ok(self
            .db
            .get(Self::device_key(device_id))?
            .map(|v| serde_json::from_slice(&v))
            .transpose()?)
    }

    /// Create-or-update keyed by the client-supplied id. Version and
    /// last-seen are overwritten on every call; the push token only when a
    /// non-empty one is supplied, so a handshake without a token does not
    /// clobber the stored one.
    pub async fn upsert_device(
        &self,
        device_id: &str,
        current_version: &str,
        fcm_token: Option<&str>,
    ) -> Result<Device> {
        let now = chrono::Utc::now().timestamp();
        let incoming_token = fcm_token.filter(|t| !t.is_empty());

        let device = match self.load_device(device_id).await? {
            Some(mut device) => {
                device.current_version = current_version.to_string();
                device.last_seen_ts = now;
                if let Some(token) = incoming_token {
                    device.fcm_token = Some(token.to_string());
                }
                device
            }
            None => Device {
                device_id: device_id.to_string(),
                current_version: current_version.to_string(),
                last_seen_ts: now,
                fcm_token: incoming_token.map(|t| t.to_string()),
            },
        };

        self.db
            .put(Self::device_key(device_id), serde_json::to_vec(&device)?)?;
        Ok(device)
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let prefix = "device:";
        let mut results = Vec::new();

        for item in self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward))
        {
            let (key, val) = item?;
            let k = str::from_utf8(&key)?;

            if !k.starts_with(prefix) {
                break;
            }

            let device: Device = serde_json::from_slice(&val)?;
            results.push(device);
        }

        Ok(results)
    }

    /// Every stored push token, duplicates included. Two devices that
    /// registered the same token get the notification twice.
    pub async fn list_push_tokens(&self) -> Result<Vec<String>> {
        Ok(self
            .list_devices()
            .await?
            .into_iter()
            .filter_map(|d| d.fcm_token)
            .filter(|t| !t.is_empty())
            .collect())
    }

    pub async fn count_devices(&self) -> Result<usize> {
        Ok(self.list_devices().await?.len())
    }

    // ============================================================
    // ADMIN SESSIONS
    // ============================================================
    fn session_key(token: &str) -> String {
        format!("session:{token}")
    }

    pub async fn save_session(&self, session: &AdminSession) -> Result<()> {
        let key = Self::session_key(&session.token);
        self.db.put(key, serde_json::to_vec(session)?)?;
        Ok(())
    }

    /// Expired records authenticate nothing and are deleted on sight.
    pub async fn load_session(&self, token: &str) -> Result<Option<AdminSession>> {
        let key = Self::session_key(token);
        let Some(raw) = self.db.get(&key)? else {
            return Ok(None);
        };

        let session: AdminSession = serde_json::from_slice(&raw)?;
        if session.is_expired(chrono::Utc::now().timestamp()) {
            self.db.delete(key)?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub async fn delete_session(&self, token: &str) -> Result<()> {
        self.db.delete(Self::session_key(token))?;
        Ok(())
    }
}
