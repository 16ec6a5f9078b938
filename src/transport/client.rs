use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::{HttpMethod, JsonRequest, JsonTransport, TransportError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `reqwest`-backed transport with fixed connect and response timeouts.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

/// Statuses whose bodies carry a JSON document worth parsing. OAuth reports
/// `authorization_pending` with 400, Graph reports token errors with 401.
fn carries_document(status: StatusCode) -> bool {
    status.is_success()
        || matches!(
            status,
            StatusCode::MOVED_PERMANENTLY
                | StatusCode::BAD_REQUEST
                | StatusCode::UNAUTHORIZED
                | StatusCode::FORBIDDEN
        )
}

#[async_trait]
impl JsonTransport for ReqwestTransport {
    async fn send(&self, request: JsonRequest) -> Result<Value, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url).form(&request.form),
        };
        builder = builder.header("Accept", "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        debug!(method = %request.method, url = %request.url, status = status.as_u16(), "HTTP response");

        if !carries_document(status) {
            return Err(TransportError::Status(status.as_u16()));
        }
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| TransportError::Decode(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_error_statuses_carry_documents() {
        assert!(carries_document(StatusCode::OK));
        assert!(carries_document(StatusCode::BAD_REQUEST));
        assert!(carries_document(StatusCode::UNAUTHORIZED));
        assert!(!carries_document(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!carries_document(StatusCode::NOT_FOUND));
    }

    #[test]
    fn form_value_finds_named_field() {
        let request = JsonRequest::builder()
            .method(HttpMethod::Post)
            .url("https://example.com")
            .form(vec![("grant_type".to_string(), "refresh_token".to_string())])
            .build();
        assert_eq!(request.form_value("grant_type"), Some("refresh_token"));
        assert_eq!(request.form_value("device_code"), None);
    }
}
