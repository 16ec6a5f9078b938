//! CLI handlers for login and logout.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{DeviceCodeAuth, FileTokenStore, PollResult, TokenStore};
use crate::config::PresenceConfig;
use crate::transport::ReqwestTransport;
use crate::util::{Clock, MonotonicClock};

/// Handle `presence-light login`.
pub async fn handle_login(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = PresenceConfig::load(config_path)?;
    config.validate()?;
    let transport = Arc::new(ReqwestTransport::with_timeout(config.request_timeout())?);
    let auth = DeviceCodeAuth::new(transport)
        .with_authority(config.authority.as_str())
        .with_scopes(config.scopes.as_str());
    let store = FileTokenStore::new(config.token_path());
    let clock = MonotonicClock::new();

    let context = auth
        .start_device_login(&config.client_id, &config.tenant)
        .await?;
    println!("{}", context.message);
    println!("⏳ Waiting for authorization...");

    loop {
        tokio::time::sleep(Duration::from_millis(context.interval_ms())).await;
        let poll = auth
            .poll_for_token(
                &config.client_id,
                &config.tenant,
                &context.device_code,
                clock.now_ms(),
            )
            .await?;
        match poll {
            PollResult::Pending { .. } => continue,
            PollResult::Granted(bundle) => {
                store.save(&bundle)?;
                println!("✅ Login successful, session saved to {}", store.path().display());
                return Ok(());
            }
            PollResult::Denied { error, description } => {
                return Err(format!("login failed: {error} ({description})").into());
            }
        }
    }
}

/// Handle `presence-light logout`.
pub async fn handle_logout(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = PresenceConfig::load(config_path)?;
    let store = FileTokenStore::new(config.token_path());
    store.clear()?;
    println!("Session cleared ({})", store.path().display());
    Ok(())
}
