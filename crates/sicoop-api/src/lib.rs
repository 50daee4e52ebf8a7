//! # sicoop-api
//!
//! HTTP API server for the Sicoop back-office.
//!
//! Serves the batch notification processing endpoint the notifications
//! screen calls, plus a health check.

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use sicoop_core::{defaults, NotificationProcessor};

pub use config::{ServerConfig, StoreBackend};
pub use error::ApiError;
pub use services::{
    LogDelivery, NotificationDelivery, PendingNotificationProcessor, WebhookDelivery,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<dyn NotificationProcessor>,
}

impl AppState {
    pub fn new(processor: Arc<dyn NotificationProcessor>) -> Self {
        Self { processor }
    }
}

/// Build the application router with tracing and permissive CORS.
///
/// The back-office front end is served from a different origin, so any
/// origin may call the processing endpoint; authorization happens at the
/// data layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            defaults::PROCESS_NOTIFICATIONS_PATH,
            post(handlers::process_pending_notifications),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
