use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::DBLayer;

/// One multicast request may carry at most this many recipient tokens.
pub const FCM_BATCH_SIZE: usize = 500;

const DEFAULT_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";

/// FCM client for admin broadcasts.
///
/// Configured from env vars: `FCM_SERVER_KEY` (required) and
/// `FCM_SEND_URL` (override). Without a server key the service stays
/// unconfigured and every broadcast attempt reports failure to the
/// caller instead of silently dropping the send.
#[derive(Clone)]
pub struct PushService {
    client: reqwest::Client,
    server_key: String,
    send_url: String,
}

#[derive(Serialize)]
struct MulticastMessage<'a> {
    registration_ids: &'a [String],
    notification: NotificationPayload<'a>,
}

#[derive(Serialize)]
struct NotificationPayload<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct MulticastResponse {
    success: u64,
    #[serde(default)]
    failure: u64,
}

impl PushService {
    pub fn from_env() -> Option<Self> {
        let server_key = dotenvy::var("FCM_SERVER_KEY").ok()?;
        let send_url =
            dotenvy::var("FCM_SEND_URL").unwrap_or_else(|_| DEFAULT_SEND_URL.to_string());
        Some(Self::new(server_key, send_url))
    }

    pub fn new(server_key: String, send_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            server_key,
            send_url,
        }
    }

    /// Send one notification to every token, `FCM_BATCH_SIZE` per provider
    /// request, sequentially.
    ///
    /// Returns the number of deliveries the provider reported successful.
    /// The first failed batch aborts the remaining ones; batches already
    /// submitted stay delivered (at-least-once, best effort). No retry.
    pub async fn broadcast(&self, tokens: &[String], title: &str, body: &str) -> Result<u64> {
        if tokens.is_empty() {
            return Ok(0);
        }

        let mut delivered = 0u64;
        for batch in tokens.chunks(FCM_BATCH_SIZE) {
            delivered += self.send_batch(batch, title, body).await?;
        }

        info!(delivered, total = tokens.len(), "broadcast finished");
        Ok(delivered)
    }

    async fn send_batch(&self, tokens: &[String], title: &str, body: &str) -> Result<u64> {
        let message = MulticastMessage {
            registration_ids: tokens,
            notification: NotificationPayload { title, body },
        };

        let response = self
            .client
            .post(&self.send_url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("key={}", self.server_key),
            )
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("fcm_error: {status}: {text}"));
        }

        let parsed: MulticastResponse = response.json().await?;
        if parsed.failure > 0 {
            warn!(failed = parsed.failure, "provider rejected tokens in batch");
        }
        Ok(parsed.success)
    }
}

/// Admin-triggered fan-out: every registered token, one shared payload.
///
/// With no tokens on record this is a no-op success and the provider is
/// never contacted, configured or not.
pub async fn broadcast_to_all(
    db: &DBLayer,
    push: Option<&PushService>,
    title: &str,
    body: &str,
) -> Result<u64> {
    let tokens = db.list_push_tokens().await?;
    if tokens.is_empty() {
        return Ok(0);
    }

    let push = push.ok_or_else(|| anyhow!("FCM_SERVER_KEY is not configured"))?;
    push.broadcast(&tokens, title, body).await
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens here; any attempted send fails fast.
    const DEAD_URL: &str = "http://127.0.0.1:9/fcm/send";

    fn open_test_db() -> DBLayer {
        let path =
            std::env::temp_dir().join(format!("mobconfig-push-test-{}", uuid::Uuid::new_v4()));
        DBLayer::new(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn batches_split_at_provider_limit() {
        let tokens: Vec<String> = (0..1200).map(|i| format!("tok-{i}")).collect();
        let sizes: Vec<usize> = tokens.chunks(FCM_BATCH_SIZE).map(|c| c.len()).collect();
        assert_eq!(sizes, vec![500, 500, 200]);
    }

    #[tokio::test]
    async fn broadcast_with_no_tokens_skips_the_provider() {
        let service = PushService::new("test-key".into(), DEAD_URL.into());
        let sent = service.broadcast(&[], "title", "body").await.unwrap();
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn transport_failure_is_an_error_not_a_count() {
        let service = PushService::new("test-key".into(), DEAD_URL.into());
        let tokens = vec!["tok-a".to_string()];
        assert!(service.broadcast(&tokens, "title", "body").await.is_err());
    }

    #[tokio::test]
    async fn broadcast_to_all_without_tokens_succeeds_unconfigured() {
        let db = open_test_db();
        db.upsert_device("dev-1", "1.0.0", None).await.unwrap();

        let sent = broadcast_to_all(&db, None, "title", "body").await.unwrap();
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn broadcast_to_all_with_tokens_requires_a_configured_service() {
        let db = open_test_db();
        db.upsert_device("dev-1", "1.0.0", Some("tok-a"))
            .await
            .unwrap();

        assert!(broadcast_to_all(&db, None, "title", "body").await.is_err());
    }
}
