//! Configuration (layered: defaults < TOML file < environment).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::flow::{DEFAULT_AUTHORITY, DEFAULT_SCOPES};
use crate::error::{LightError, Result};
use crate::presence::DEFAULT_PRESENCE_URL;

/// Generic public client id usable with any tenant.
pub const DEFAULT_CLIENT_ID: &str = "3837bbf0-30fb-47ad-bce8-f460ba9880c3";
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;
pub const MAX_POLL_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_LED_COUNT: u32 = 16;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_REFRESH_LOOKAHEAD_SECS: u64 = 60;
pub const DEFAULT_ERROR_RETRY_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Settings consumed read-only by the presence core.
///
/// # Example
/// ```
/// use presence_light::config::PresenceConfig;
///
/// let config: PresenceConfig = toml::from_str(r#"
///     tenant = "contoso.onmicrosoft.com"
///     poll_interval_secs = 5
/// "#).unwrap();
/// assert_eq!(config.poll_interval().as_secs(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresenceConfig {
    pub client_id: String,
    pub tenant: String,
    pub poll_interval_secs: u64,
    /// Carried for the display; not interpreted by the core.
    pub led_count: u32,
    pub authority: String,
    pub presence_url: String,
    pub scopes: String,
    pub token_path: Option<PathBuf>,
    /// Consecutive presence failures before a token refresh is forced.
    pub failure_threshold: u32,
    pub refresh_lookahead_secs: u64,
    pub error_retry_secs: u64,
    pub request_timeout_secs: u64,
    /// Start the device login on our own when no session is stored.
    pub auto_device_login: bool,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            tenant: String::new(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            led_count: DEFAULT_LED_COUNT,
            authority: DEFAULT_AUTHORITY.to_string(),
            presence_url: DEFAULT_PRESENCE_URL.to_string(),
            scopes: DEFAULT_SCOPES.to_string(),
            token_path: None,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            refresh_lookahead_secs: DEFAULT_REFRESH_LOOKAHEAD_SECS,
            error_retry_secs: DEFAULT_ERROR_RETRY_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            auto_device_login: false,
        }
    }
}

impl PresenceConfig {
    /// Default config file path (`<config dir>/presence-light/config.toml`).
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "presence-light")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("presence-light.toml"))
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(LightError::Io(err)),
        };
        toml::from_str(&raw).map_err(|err| {
            LightError::Configuration(format!("{}: {err}", path.display()))
        })
    }

    /// Load the file (explicit or default path), then apply `.env` and
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        let mut config = Self::load_from_path(&path)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply `PRESENCE_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("PRESENCE_CLIENT_ID") {
            self.client_id = value;
        }
        if let Some(value) = lookup("PRESENCE_TENANT") {
            self.tenant = value;
        }
        if let Some(value) = lookup("PRESENCE_POLL_INTERVAL") {
            self.poll_interval_secs = parse_env("PRESENCE_POLL_INTERVAL", &value)?;
        }
        if let Some(value) = lookup("PRESENCE_LED_COUNT") {
            self.led_count = parse_env("PRESENCE_LED_COUNT", &value)?;
        }
        if let Some(value) = lookup("PRESENCE_TOKEN_PATH") {
            self.token_path = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Poll interval clamped to the supported 10–300 s range.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.poll_interval_secs
                .clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS),
        )
    }

    pub fn refresh_lookahead(&self) -> Duration {
        Duration::from_secs(self.refresh_lookahead_secs)
    }

    pub fn error_retry(&self) -> Duration {
        Duration::from_secs(self.error_retry_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Both values the identity provider needs are set.
    pub fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.tenant.trim().is_empty()
    }

    pub fn token_path(&self) -> PathBuf {
        self.token_path.clone().unwrap_or_else(|| {
            crate::auth::FileTokenStore::new_default().path().to_path_buf()
        })
    }

    /// Reject values the configuration portal would refuse.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.client_id.trim().len() < 36 {
            problems.push("client id must be at least 36 characters");
        }
        if self.tenant.trim().len() < 10 {
            problems.push("tenant host or id must be at least 10 characters");
        }
        if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&self.poll_interval_secs) {
            problems.push("poll interval must be between 10 and 300 seconds");
        }
        if self.led_count == 0 {
            problems.push("led count must be at least 1");
        }
        if self.failure_threshold == 0 {
            problems.push("failure threshold must be at least 1");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(LightError::Configuration(problems.join("; ")))
        }
    }

    pub fn settings_report(&self) -> SettingsReport {
        SettingsReport {
            client_id: self.client_id.clone(),
            tenant: self.tenant.clone(),
            poll_interval: self.poll_interval().as_secs(),
            num_leds: self.led_count,
        }
    }
}

/// Read-only view of the user-facing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsReport {
    pub client_id: String,
    pub tenant: String,
    pub poll_interval: u64,
    pub num_leds: u32,
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LightError::Configuration(format!("{name} is not a number: {value}")))
}
