//! Error types for presence-light.

use thiserror::Error;

use crate::auth::AuthError;
use crate::presence::FetchError;
use crate::transport::TransportError;

/// Broad error category used to route recovery in the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Server unreachable, timeout, TLS, unexpected status.
    Transport,
    /// HTTP succeeded but the JSON document lacks expected fields.
    Protocol,
    /// Well-formed error object returned by the provider.
    Application,
    /// Token persistence failed.
    Storage,
    Configuration,
    /// Operation not allowed in the current lifecycle state.
    State,
}

/// Primary error type for presence-light operations.
#[derive(Error, Debug)]
pub enum LightError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Presence error: {0}")]
    Presence(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device login already running")]
    LoginAlreadyRunning,

    #[error("Not connected")]
    NotConnected,
}

impl LightError {
    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Auth(err) => err.category(),
            Self::Presence(err) => err.category(),
            Self::Io(_) => ErrorCategory::Storage,
            Self::LoginAlreadyRunning | Self::NotConnected => ErrorCategory::State,
        }
    }

    /// Whether retrying the same operation later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::Protocol
        )
    }
}

impl From<TransportError> for LightError {
    fn from(error: TransportError) -> Self {
        Self::Auth(AuthError::Transport(error))
    }
}

impl From<toml::de::Error> for LightError {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LightError>;
