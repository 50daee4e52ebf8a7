//! Error types for the Sicoop back-office.

use thiserror::Error;

/// Result type alias using Sicoop's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Sicoop operations.
///
/// Every failure path of a screen ends in one of these variants, and every
/// variant carries a message that can be shown to the user as-is.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Form validation failed before anything was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid input (bad identifiers, unsupported operations)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failed (missing or expired session)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (capability check or row-level security)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The remote store answered with an error
    #[error("Remote error: {0}")]
    Remote(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An action with the same key is still in flight
    #[error("Busy: {0}")]
    Busy(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Message shown next to the triggering control or in a toast.
    ///
    /// Validation and permission messages are already written for the user;
    /// everything else keeps its category prefix so support can tell a
    /// network failure from a store rejection.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) | Error::Forbidden(msg) | Error::Busy(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error should render the full-screen access-denied block.
    pub fn is_permission(&self) -> bool {
        matches!(self, Error::Forbidden(_) | Error::Unauthorized(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
