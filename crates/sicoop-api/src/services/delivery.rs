//! Delivery backends for queued notifications.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use sicoop_core::{defaults, Error, NotificationLog, Result};

/// Event header sent with every webhook delivery.
pub const EVENT_HEADER: &str = "X-Sicoop-Event";

/// Event name of a notification delivery.
pub const DELIVERY_EVENT: &str = "notification.deliver";

/// Sends one queued notification to its recipient.
#[async_trait]
pub trait NotificationDelivery: Send + Sync {
    async fn deliver(&self, log: &NotificationLog) -> Result<()>;
}

/// Records the delivery in the log output only.
///
/// Used when no webhook is configured, so a local stack can exercise the
/// full pending → sent cycle.
#[derive(Debug, Clone, Default)]
pub struct LogDelivery;

#[async_trait]
impl NotificationDelivery for LogDelivery {
    async fn deliver(&self, log: &NotificationLog) -> Result<()> {
        info!(
            subsystem = "api",
            component = "delivery",
            op = "log",
            record_id = %log.id,
            email = %log.email,
            subject = %log.subject,
            "Notification delivered to log"
        );
        Ok(())
    }
}

/// POSTs each notification as JSON to a webhook (mail relay, queue...).
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    client: reqwest::Client,
    url: String,
}

impl WebhookDelivery {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::WEBHOOK_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationDelivery for WebhookDelivery {
    async fn deliver(&self, log: &NotificationLog) -> Result<()> {
        let payload = json!({
            "id": log.id,
            "email": log.email,
            "subject": log.subject,
            "content": log.content,
            "user_id": log.user_id,
            "category_id": log.category_id,
        });

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header(EVENT_HEADER, DELIVERY_EVENT)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(
                subsystem = "api",
                component = "delivery",
                op = "webhook",
                record_id = %log.id,
                status_code = status.as_u16(),
                "Webhook accepted notification"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let detail = body.trim();
        Err(Error::Remote(if detail.is_empty() {
            format!("Webhook returned {}", status)
        } else {
            format!("Webhook returned {}: {}", status, detail)
        }))
    }
}
