//! Route handlers.

use axum::{extract::State, Json};
use serde_json::{json, Value as JsonValue};
use tracing::warn;

use sicoop_core::ProcessingResponse;

use crate::{ApiError, AppState};

/// `GET /health`
pub async fn health() -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /api/process-pending-notifications`
///
/// Failures answer with a non-2xx status and `{success: false, error}`.
pub async fn process_pending_notifications(
    State(state): State<AppState>,
) -> Result<Json<ProcessingResponse>, ApiError> {
    match state.processor.process_pending().await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            warn!(
                subsystem = "api",
                component = "handlers",
                op = "process_pending_notifications",
                error = %e,
                "Notification processing failed"
            );
            Err(ApiError::from(e))
        }
    }
}
