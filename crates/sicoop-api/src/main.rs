use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sicoop_api::{
    router, AppState, LogDelivery, NotificationDelivery, PendingNotificationProcessor,
    ServerConfig, StoreBackend, WebhookDelivery,
};
use sicoop_db::{MemoryStore, RestClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "sicoop_api=debug,sicoop_db=info,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sicoop_api=debug,sicoop_db=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("sicoop-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
        None
    } else {
        let mut layer = tracing_subscriber::fmt::layer();
        if let Some(ansi) = log_ansi {
            layer = layer.with_ansi(ansi);
        }
        registry.with(layer).init();
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env()?;

    let delivery: Arc<dyn NotificationDelivery> = match config.webhook_url {
        Some(ref url) => {
            info!(webhook_url = %url, "Delivering notifications to webhook");
            Arc::new(WebhookDelivery::new(url.clone())?)
        }
        None => {
            info!("No NOTIFICATION_WEBHOOK_URL set, deliveries are logged only");
            Arc::new(LogDelivery)
        }
    };

    let processor = match config.store {
        StoreBackend::Supabase(ref supabase) => {
            let client = RestClient::new(supabase.clone())?;
            PendingNotificationProcessor::from_provider(&client, delivery, config.batch_limit)
        }
        StoreBackend::Memory => {
            tracing::warn!("SUPABASE_ANON_KEY not set, using an empty in-memory store");
            PendingNotificationProcessor::from_provider(
                &MemoryStore::new(),
                delivery,
                config.batch_limit,
            )
        }
    };

    let app = router(AppState::new(Arc::new(processor)));

    let addr = config.addr()?;
    info!(
        %addr,
        batch_limit = config.batch_limit,
        "Starting Sicoop API server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
