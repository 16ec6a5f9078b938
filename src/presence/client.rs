use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::PresenceSnapshot;
use crate::error::ErrorCategory;
use crate::transport::{HttpMethod, JsonRequest, JsonTransport, TransportError};

pub const DEFAULT_PRESENCE_URL: &str = "https://graph.microsoft.com/v1.0/me/presence";
const INVALID_TOKEN_CODE: &str = "InvalidAuthenticationToken";

/// Why a presence fetch produced no snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Invalid presence response: {0}")]
    Protocol(String),
    /// The bearer token was rejected; refreshing it is the fix.
    #[error("Access token rejected: {0}")]
    InvalidToken(String),
    #[error("Presence service error {code}: {message}")]
    Provider { code: String, message: String },
}

impl FetchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Protocol(_) => ErrorCategory::Protocol,
            Self::InvalidToken(_) | Self::Provider { .. } => ErrorCategory::Application,
        }
    }
}

/// Reads the signed-in user's presence.
#[derive(Clone)]
pub struct PresenceClient {
    transport: Arc<dyn JsonTransport>,
    url: String,
}

impl PresenceClient {
    pub fn new(transport: Arc<dyn JsonTransport>) -> Self {
        Self {
            transport,
            url: DEFAULT_PRESENCE_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self, access_token: &str) -> Result<PresenceSnapshot, FetchError> {
        let request = JsonRequest::builder()
            .method(HttpMethod::Get)
            .url(self.url.as_str())
            .bearer(access_token)
            .build();
        let document = self.transport.send(request).await?;
        snapshot_from(&document)
    }
}

fn snapshot_from(document: &Value) -> Result<PresenceSnapshot, FetchError> {
    if let Some(error) = document.get("error") {
        let code = error
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if code == INVALID_TOKEN_CODE {
            return Err(FetchError::InvalidToken(message));
        }
        return Err(FetchError::Provider { code, message });
    }

    let field = |name: &str| {
        document
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::Protocol(format!("response missing {name}")))
    };
    let snapshot = PresenceSnapshot::parse(field("availability")?, field("activity")?);
    debug!(availability = %snapshot.availability, activity = %snapshot.activity, "Presence fetched");
    Ok(snapshot)
}
