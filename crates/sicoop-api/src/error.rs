//! HTTP error mapping.

use axum::{http::StatusCode, response::IntoResponse, Json};

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    Remote(sicoop_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<sicoop_core::Error> for ApiError {
    fn from(err: sicoop_core::Error) -> Self {
        use sicoop_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) | Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::Busy(msg) => ApiError::Conflict(msg),
            other => ApiError::Remote(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Remote(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Remote(sicoop_core::Error::Remote(msg)) => msg.clone(),
            ApiError::Remote(err) => err.user_message(),
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        // `success: false` keeps the body readable as a processing response.
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message(),
        }));

        (status, body).into_response()
    }
}
