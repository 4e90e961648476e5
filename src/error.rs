//! Error types for Signal Deck.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Rejections at the card store's append boundary.
///
/// A rejected batch leaves the store untouched.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Card at position {index} has an empty id")]
    EmptyId { index: usize },

    #[error("Card id {id} already exists in the deck")]
    DuplicateId { id: String },

    #[error("Card id {id} was already triaged in this deck generation")]
    AlreadyTriaged { id: String },

    #[error("Malformed card payload: {0}")]
    Malformed(String),
}

/// Errors from external feedback sources (e.g. Slack).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Source {name} is not configured: {reason}")]
    NotConfigured { name: String, reason: String },

    #[error("Request to {name} failed: {reason}")]
    RequestFailed { name: String, reason: String },

    #[error("Source {name} returned an error: {reason}")]
    Api { name: String, reason: String },

    #[error("Import error: {0}")]
    Import(#[from] ImportError),
}

impl Error {
    /// HTTP status for this error when it ends a request.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Import(e) | Self::Source(SourceError::Import(e)) => match e {
                ImportError::Malformed(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ImportError::EmptyId { .. }
                | ImportError::DuplicateId { .. }
                | ImportError::AlreadyTriaged { .. } => StatusCode::CONFLICT,
            },
            Self::Source(SourceError::NotConfigured { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Source(SourceError::RequestFailed { .. } | SourceError::Api { .. }) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Import(e) | Self::Source(SourceError::Import(e)) => e.to_string(),
            Self::Source(e) => e.to_string(),
            Self::Config(e) => e.to_string(),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
