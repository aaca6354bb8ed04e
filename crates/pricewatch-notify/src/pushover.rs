//! Pushover notifier.
//!
//! Posts form fields `token`, `user` and `message` to the messages endpoint.
//! Pushover answers `{"status": 1, ...}` on success.

use crate::error::{NotifyError, NotifyResult};
use crate::notifier::Notifier;
use pricewatch_core::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Pushover messages endpoint.
pub const DEFAULT_PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// Pushover credentials and endpoint.
#[derive(Debug, Clone)]
pub struct PushoverConfig {
    pub api_url: String,
    pub user_key: Option<String>,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl Default for PushoverConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_PUSHOVER_URL.to_string(),
            user_key: None,
            api_token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl PushoverConfig {
    /// Both credentials present and non-empty.
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.user_key) && present(&self.api_token)
    }
}

#[derive(Debug, Deserialize)]
struct PushoverResponse {
    status: i64,
    #[serde(default)]
    errors: Vec<String>,
}

/// Pushover notifier.
pub struct PushoverNotifier {
    client: Client,
    config: PushoverConfig,
}

impl PushoverNotifier {
    pub fn new(config: PushoverConfig) -> NotifyResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifyError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        if !config.is_configured() {
            info!("Pushover credentials missing, notifications will not be delivered");
        }
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn post(&self, message: &str) -> NotifyResult<()> {
        let (Some(user), Some(token)) = (&self.config.user_key, &self.config.api_token) else {
            return Err(NotifyError::NotConfigured(
                "Pushover user key or API token missing".to_string(),
            ));
        };
        if !self.config.is_configured() {
            return Err(NotifyError::NotConfigured(
                "Pushover user key or API token empty".to_string(),
            ));
        }

        let form = [
            ("token", token.as_str()),
            ("user", user.as_str()),
            ("message", message),
        ];
        let response = self
            .client
            .post(&self.config.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        match serde_json::from_str::<PushoverResponse>(&body) {
            Ok(parsed) if parsed.status != 1 => Err(NotifyError::Status {
                status: status.as_u16(),
                body: parsed.errors.join("; "),
            }),
            _ => {
                debug!(status = %status, "Pushover accepted message");
                Ok(())
            }
        }
    }
}

impl Notifier for PushoverNotifier {
    fn send<'a>(&'a self, message: &'a str) -> BoxFuture<'a, NotifyResult<()>> {
        Box::pin(self.post(message))
    }
}
