use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::device_code::{DeviceLoginContext, PollResult};
use super::error::AuthError;
use super::token::{expiry_from, TokenBundle};
use crate::transport::{HttpMethod, JsonRequest, JsonTransport};

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const DEFAULT_SCOPES: &str = "offline_access openid Presence.Read";
const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const AUTHORIZATION_PENDING: &str = "authorization_pending";
/// Assumed lifetime when a refresh response omits `expires_in` and the
/// previous expiry is unknown.
pub const FALLBACK_TOKEN_LIFETIME_SECS: u64 = 3600;

/// OAuth2 device-code driver. Every operation performs exactly one request.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use presence_light::auth::DeviceCodeAuth;
/// use presence_light::transport::ReqwestTransport;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let auth = DeviceCodeAuth::new(Arc::new(ReqwestTransport::new()?));
/// let context = auth.start_device_login("client-id", "contoso.onmicrosoft.com").await?;
/// println!("{}", context.message);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DeviceCodeAuth {
    transport: Arc<dyn JsonTransport>,
    authority: String,
    scopes: String,
}

impl std::fmt::Debug for DeviceCodeAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCodeAuth")
            .field("authority", &self.authority)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl DeviceCodeAuth {
    pub fn new(transport: Arc<dyn JsonTransport>) -> Self {
        Self {
            transport,
            authority: DEFAULT_AUTHORITY.to_string(),
            scopes: DEFAULT_SCOPES.to_string(),
        }
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = scopes.into();
        self
    }

    fn endpoint(&self, tenant: &str, name: &str) -> String {
        format!("{}/{tenant}/oauth2/v2.0/{name}", self.authority)
    }

    async fn post(&self, url: String, form: Vec<(&str, &str)>) -> Result<Value, AuthError> {
        let request = JsonRequest::builder()
            .method(HttpMethod::Post)
            .url(url)
            .form(
                form.into_iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            )
            .build();
        Ok(self.transport.send(request).await?)
    }

    /// Request a device code and user code for a new login.
    pub async fn start_device_login(
        &self,
        client_id: &str,
        tenant: &str,
    ) -> Result<DeviceLoginContext, AuthError> {
        let document = self
            .post(
                self.endpoint(tenant, "devicecode"),
                vec![("client_id", client_id), ("scope", self.scopes.as_str())],
            )
            .await?;
        let payload: DeviceCodeResponse = parse(document)?;
        if let Some(code) = payload.error {
            return Err(AuthError::Provider {
                code,
                description: payload.error_description.unwrap_or_default(),
            });
        }
        let context = DeviceLoginContext {
            device_code: payload.device_code.ok_or_else(|| AuthError::missing("device_code"))?,
            user_code: payload.user_code.ok_or_else(|| AuthError::missing("user_code"))?,
            interval_secs: payload.interval.ok_or_else(|| AuthError::missing("interval"))?,
            verification_uri: payload
                .verification_uri
                .ok_or_else(|| AuthError::missing("verification_uri"))?,
            message: payload.message.ok_or_else(|| AuthError::missing("message"))?,
        };
        info!(
            user_code = %context.user_code,
            verification_uri = %context.verification_uri,
            interval_secs = context.interval_secs,
            "Device login started"
        );
        Ok(context)
    }

    /// Ask whether the user has completed the login yet.
    pub async fn poll_for_token(
        &self,
        client_id: &str,
        tenant: &str,
        device_code: &str,
        now_ms: u64,
    ) -> Result<PollResult, AuthError> {
        let document = self
            .post(
                self.endpoint(tenant, "token"),
                vec![
                    ("client_id", client_id),
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("device_code", device_code),
                ],
            )
            .await?;
        let payload: TokenResponse = parse(document)?;

        if let Some(error) = payload.error {
            let description = payload.error_description.unwrap_or_default();
            if error == AUTHORIZATION_PENDING {
                debug!(%description, "Waiting for user authorization");
                return Ok(PollResult::Pending { description });
            }
            warn!(%error, %description, "Device login rejected");
            return Ok(PollResult::Denied { error, description });
        }

        match (
            payload.access_token,
            payload.refresh_token,
            payload.id_token,
            payload.expires_in,
        ) {
            (Some(access), Some(refresh), Some(id), Some(expires_in)) => {
                info!(expires_in, "Device login granted");
                Ok(PollResult::Granted(TokenBundle::new(
                    access,
                    refresh,
                    id,
                    expiry_from(now_ms, expires_in),
                )))
            }
            _ => Err(AuthError::Protocol(
                "token response missing tokens and error".to_string(),
            )),
        }
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Fields absent from the response keep their value from `current`. An
    /// expiry that is unknown or past becomes [`FALLBACK_TOKEN_LIFETIME_SECS`].
    pub async fn refresh(
        &self,
        client_id: &str,
        tenant: &str,
        current: &TokenBundle,
        now_ms: u64,
    ) -> Result<TokenBundle, AuthError> {
        let document = self
            .post(
                self.endpoint(tenant, "token"),
                vec![
                    ("client_id", client_id),
                    ("grant_type", "refresh_token"),
                    ("refresh_token", current.refresh_token.as_str()),
                ],
            )
            .await?;
        let payload: TokenResponse = parse(document)?;
        if let Some(code) = payload.error {
            return Err(AuthError::Provider {
                code,
                description: payload.error_description.unwrap_or_default(),
            });
        }

        let mut bundle = current.clone();
        bundle.access_token = payload
            .access_token
            .ok_or_else(|| AuthError::missing("access_token"))?;
        bundle.refresh_token = payload
            .refresh_token
            .ok_or_else(|| AuthError::missing("refresh_token"))?;
        if let Some(id_token) = payload.id_token {
            bundle.id_token = id_token;
        }
        match payload.expires_in {
            Some(expires_in) => bundle.expires_at_ms = expiry_from(now_ms, expires_in),
            // Restored bundles carry expiry 0.
            None if bundle.lifetime_ms(now_ms) <= 0 => {
                debug!(
                    fallback_secs = FALLBACK_TOKEN_LIFETIME_SECS,
                    "Refresh response has no expires_in"
                );
                bundle.expires_at_ms = expiry_from(now_ms, FALLBACK_TOKEN_LIFETIME_SECS);
            }
            None => {}
        }
        info!(lifetime_secs = bundle.lifetime_secs(now_ms), "Token refreshed");
        Ok(bundle)
    }
}

fn parse<T: for<'de> Deserialize<'de>>(document: Value) -> Result<T, AuthError> {
    serde_json::from_value(document).map_err(|err| AuthError::Protocol(err.to_string()))
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: Option<String>,
    user_code: Option<String>,
    verification_uri: Option<String>,
    message: Option<String>,
    interval: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    id_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}
