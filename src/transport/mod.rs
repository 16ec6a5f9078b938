//! JSON-over-HTTP transport seam.
//!
//! The state machine never talks to `reqwest` directly; every network call
//! goes through [`JsonTransport`] so tests can script responses.

mod client;

pub use client::ReqwestTransport;

use async_trait::async_trait;
use bon::Builder;
use serde_json::Value;
use thiserror::Error;

/// HTTP method for a [`JsonRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// A single request/response exchange.
///
/// # Example
/// ```
/// use presence_light::transport::{HttpMethod, JsonRequest};
///
/// let request = JsonRequest::builder()
///     .method(HttpMethod::Post)
///     .url("https://login.example.com/tenant/oauth2/v2.0/devicecode")
///     .form(vec![("client_id".to_string(), "abc".to_string())])
///     .build();
/// assert!(request.bearer.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct JsonRequest {
    pub method: HttpMethod,
    #[builder(into)]
    pub url: String,
    /// `application/x-www-form-urlencoded` body; ignored for GET.
    #[builder(default)]
    pub form: Vec<(String, String)>,
    /// Sent as `Authorization: Bearer <token>`.
    #[builder(into)]
    pub bearer: Option<String>,
}

impl JsonRequest {
    /// Look up a form field by name.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Failures below the JSON document level. They carry no parsed error code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Unable to connect: {0}")]
    Connect(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    #[error("Malformed JSON response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Connect(error.to_string())
        }
    }
}

/// Blocking-per-call JSON request function.
///
/// Implementations resolve to the parsed JSON document for every response
/// that carries one (including OAuth `400` error bodies), or to a
/// [`TransportError`].
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn send(&self, request: JsonRequest) -> Result<Value, TransportError>;
}
