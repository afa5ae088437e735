//! Error types for fleet client operations

use serde::Deserialize;
use thiserror::Error;

/// Result type alias for fleet client operations
pub type Result<T> = std::result::Result<T, FleetClientError>;

/// Errors that can occur during fleet client operations
#[derive(Error, Debug)]
pub enum FleetClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Server returned an error response
    #[error("Server error {status}: {message}")]
    ServerError {
        status: u16,
        message: String,
        /// Invalid field, for validation failures
        field: Option<String>,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl FleetClientError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
            field: None,
        }
    }

    /// HTTP status of a server error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Invalid field reported by the server, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ServerError { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

/// Error body returned by the server
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
    #[serde(default)]
    pub field: Option<String>,
}
