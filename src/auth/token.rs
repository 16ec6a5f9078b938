use serde::{Deserialize, Serialize};

/// Credentials for the presence endpoint.
///
/// `expires_at_ms` is an absolute deadline on the monotonic clock used by
/// the state machine. It is never persisted; a bundle restored from storage
/// carries `0` and is always refreshed before use.
///
/// # Example
/// ```
/// use presence_light::auth::TokenBundle;
///
/// let bundle = TokenBundle::new("access", "refresh", "id", 3_600_000);
/// assert!(bundle.is_complete());
/// assert_eq!(bundle.lifetime_secs(3_000_000), 600);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub id_token: String,
    #[serde(skip)]
    pub expires_at_ms: u64,
}

impl TokenBundle {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        id_token: impl Into<String>,
        expires_at_ms: u64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            id_token: id_token.into(),
            expires_at_ms,
        }
    }

    /// All three credential strings are present.
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty() && !self.id_token.is_empty()
    }

    /// Remaining lifetime in milliseconds; negative once expired.
    pub fn lifetime_ms(&self, now_ms: u64) -> i64 {
        self.expires_at_ms as i64 - now_ms as i64
    }

    pub fn lifetime_secs(&self, now_ms: u64) -> i64 {
        self.lifetime_ms(now_ms) / 1000
    }

    /// Whether at most `lookahead_ms` of lifetime remain at `now_ms`.
    pub fn expires_within(&self, now_ms: u64, lookahead_ms: u64) -> bool {
        self.lifetime_ms(now_ms) <= lookahead_ms as i64
    }
}

/// Absolute expiry for a relative `expires_in` in seconds.
pub(crate) fn expiry_from(now_ms: u64, expires_in_secs: u64) -> u64 {
    now_ms.saturating_add(expires_in_secs.saturating_mul(1000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_bundle_is_incomplete() {
        let bundle = TokenBundle::new("access", "", "id", 0);
        assert!(!bundle.is_complete());
        assert!(!TokenBundle::default().is_complete());
    }

    #[test]
    fn loaded_bundle_is_already_expiring() {
        let bundle = TokenBundle::new("a", "r", "i", 0);
        assert!(bundle.expires_within(0, 60_000));
        assert!(bundle.lifetime_ms(5_000) < 0);
    }

    #[test]
    fn expiry_is_absolute() {
        assert_eq!(expiry_from(1_000, 3600), 3_601_000);
        let bundle = TokenBundle::new("a", "r", "i", expiry_from(1_000, 3600));
        assert!(!bundle.expires_within(1_000, 60_000));
        assert!(!bundle.expires_within(3_540_999, 60_000));
        assert!(bundle.expires_within(3_541_000, 60_000));
    }
}
