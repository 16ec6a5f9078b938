use serde::Serialize;

use super::TokenBundle;

/// Device-code session details returned by the identity provider.
///
/// # Example
/// ```
/// use presence_light::auth::DeviceLoginContext;
///
/// let context = DeviceLoginContext {
///     device_code: "D1".to_string(),
///     user_code: "U1".to_string(),
///     verification_uri: "https://microsoft.com/devicelogin".to_string(),
///     message: "To sign in, use a web browser...".to_string(),
///     interval_secs: 5,
/// };
/// assert_eq!(context.interval_ms(), 5_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLoginContext {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub message: String,
    /// Minimum spacing between token polls, as dictated by the provider.
    pub interval_secs: u64,
}

impl DeviceLoginContext {
    pub fn interval_ms(&self) -> u64 {
        self.interval_secs.saturating_mul(1000)
    }

    /// The part of the session that is safe to show to the user.
    pub fn prompt(&self) -> DeviceLoginPrompt {
        DeviceLoginPrompt {
            user_code: self.user_code.clone(),
            verification_uri: self.verification_uri.clone(),
            message: self.message.clone(),
        }
    }
}

/// What the user needs to complete the login on another device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceLoginPrompt {
    pub user_code: String,
    pub verification_uri: String,
    pub message: String,
}

/// Outcome of a single token poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// User has not finished yet; poll again after the interval.
    Pending { description: String },
    /// Provider rejected the flow; the login attempt is over.
    Denied { error: String, description: String },
    Granted(TokenBundle),
}
