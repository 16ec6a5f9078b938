use thiserror::Error;

use crate::error::ErrorCategory;
use crate::transport::TransportError;

/// Errors from the auth flow driver and token persistence.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Invalid response: {0}")]
    Protocol(String),
    #[error("Provider error {code}: {description}")]
    Provider { code: String, description: String },
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::Protocol(format!("response missing {field}"))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Protocol(_) => ErrorCategory::Protocol,
            Self::Provider { .. } => ErrorCategory::Application,
            Self::Io(_) | Self::Serialization(_) => ErrorCategory::Storage,
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
