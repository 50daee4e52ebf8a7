//! Client for the batch notification processing endpoint.

use std::env;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use sicoop_core::{defaults, Error, NotificationProcessor, ProcessingResponse, Result};

/// Calls `POST /api/process-pending-notifications` on the Sicoop API.
#[derive(Debug, Clone)]
pub struct NotificationProcessingClient {
    client: Client,
    base_url: String,
    bearer: Option<String>,
}

impl NotificationProcessingClient {
    pub fn new(base_url: impl Into<String>, bearer: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::REMOTE_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            bearer,
        })
    }

    /// `SICOOP_API_URL` for the server, `SUPABASE_ACCESS_TOKEN` as the bearer.
    pub fn from_env() -> Result<Self> {
        Self::new(
            env::var("SICOOP_API_URL").unwrap_or_else(|_| defaults::API_URL.to_string()),
            env::var("SUPABASE_ACCESS_TOKEN").ok().filter(|s| !s.is_empty()),
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            defaults::PROCESS_NOTIFICATIONS_PATH
        )
    }
}

#[async_trait]
impl NotificationProcessor for NotificationProcessingClient {
    async fn process_pending(&self) -> Result<ProcessingResponse> {
        let started = Instant::now();
        let mut request = self.client.post(self.endpoint());
        if let Some(ref token) = self.bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let parsed: Option<ProcessingResponse> = serde_json::from_str(&body).ok();
        match parsed {
            Some(result) if status.is_success() && result.success => {
                info!(
                    subsystem = "db",
                    component = "processing_client",
                    processed_count = result.processed_count.unwrap_or(0),
                    duration_ms,
                    "Notification batch processed"
                );
                Ok(result)
            }
            other => {
                let message = other
                    .and_then(|r| r.error.or(r.message))
                    .unwrap_or_else(|| format!("Notification processing failed ({})", status));
                warn!(
                    subsystem = "db",
                    component = "processing_client",
                    status_code = status.as_u16(),
                    duration_ms,
                    error = %message,
                    "Notification batch failed"
                );
                Err(Error::Remote(message))
            }
        }
    }
}
