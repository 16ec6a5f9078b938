//! CLI handlers for running the state machine and reporting settings.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;

use super::RunArgs;
use crate::auth::FileTokenStore;
use crate::config::PresenceConfig;
use crate::error::Result;
use crate::machine::{Event, PresenceMachine};
use crate::status::TracingDisplay;
use crate::transport::ReqwestTransport;
use crate::util::{Clock, MonotonicClock};

/// Handle `presence-light run`.
pub async fn handle_run(
    config_path: Option<&Path>,
    args: RunArgs,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = run_config(config_path, &args)?;
    let transport = Arc::new(ReqwestTransport::with_timeout(config.request_timeout())?);
    let store = Arc::new(FileTokenStore::new(config.token_path()));
    let display = Arc::new(TracingDisplay::new(config.led_count));
    let mut machine = PresenceMachine::new(config, transport, store, display);
    let clock = MonotonicClock::new();

    // The host OS owns the network link.
    machine.push_event(Event::ConnectivityEstablished);

    let mut ticker = tokio::time::interval(Duration::from_millis(args.tick_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shown_prompt = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
            _ = ticker.tick() => {
                machine.tick(clock.now_ms()).await;
                let prompt = machine.pending_login();
                if let Some(fresh) = prompt.as_ref().filter(|p| shown_prompt.as_ref() != Some(*p)) {
                    println!("{}", fresh.message);
                }
                shown_prompt = prompt;
            }
        }
    }
}

/// Load the configuration for `run`, applying flags and rejecting values
/// `validate` refuses.
fn run_config(config_path: Option<&Path>, args: &RunArgs) -> Result<PresenceConfig> {
    let mut config = PresenceConfig::load(config_path)?;
    if args.login {
        config.auto_device_login = true;
    }
    config.validate()?;
    Ok(config)
}

/// Handle `presence-light settings`.
pub async fn handle_settings(
    config_path: Option<&Path>,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = PresenceConfig::load(config_path)?;
    let report = config.settings_report();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
