//! Presence state machine.
//!
//! [`PresenceMachine::tick`] is called from a cooperative driver loop. Each
//! call consumes pending [`Event`]s, runs entry side effects for a changed
//! state, and performs at most one network request. Transitions that need no
//! network chain within the same tick.

mod event;
mod state;

pub use event::Event;
pub use state::{LifecycleState, MachineState};

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{
    AuthError, DeviceCodeAuth, DeviceLoginContext, DeviceLoginPrompt, PollResult, TokenBundle,
    TokenStore,
};
use crate::config::{PresenceConfig, SettingsReport};
use crate::error::{LightError, Result};
use crate::presence::{FetchError, PresenceClient, PresenceSnapshot};
use crate::status::{Status, StatusDisplay};
use crate::transport::JsonTransport;

/// Upper bound on chained transitions within one tick.
const MAX_STEPS_PER_TICK: usize = 16;

enum Step {
    /// State changed without using the network; evaluate again.
    Continue,
    /// Nothing more to do until a later tick.
    Wait,
}

/// Owns the session, the lifecycle state and all collaborators.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use presence_light::auth::FileTokenStore;
/// use presence_light::config::PresenceConfig;
/// use presence_light::machine::{Event, PresenceMachine};
/// use presence_light::status::TracingDisplay;
/// use presence_light::transport::ReqwestTransport;
/// use presence_light::util::{Clock, MonotonicClock};
///
/// # async fn example() -> presence_light::error::Result<()> {
/// let config = PresenceConfig::load(None)?;
/// let mut machine = PresenceMachine::new(
///     config.clone(),
///     Arc::new(ReqwestTransport::with_timeout(config.request_timeout())?),
///     Arc::new(FileTokenStore::new(config.token_path())),
///     Arc::new(TracingDisplay::new(config.led_count)),
/// );
/// let clock = MonotonicClock::new();
/// machine.push_event(Event::ConnectivityEstablished);
/// loop {
///     machine.tick(clock.now_ms()).await;
///     tokio::time::sleep(std::time::Duration::from_millis(50)).await;
/// }
/// # }
/// ```
pub struct PresenceMachine {
    config: PresenceConfig,
    auth: DeviceCodeAuth,
    presence: PresenceClient,
    store: Arc<dyn TokenStore>,
    display: Arc<dyn StatusDisplay>,
    state: MachineState,
    tokens: Option<TokenBundle>,
    login: Option<DeviceLoginContext>,
    snapshot: Option<PresenceSnapshot>,
    events: VecDeque<Event>,
    last_status: Option<Status>,
}

impl std::fmt::Debug for PresenceMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceMachine")
            .field("state", &self.state)
            .field("has_session", &self.tokens.is_some())
            .field("snapshot", &self.snapshot)
            .field("last_status", &self.last_status)
            .finish()
    }
}

impl PresenceMachine {
    pub fn new(
        config: PresenceConfig,
        transport: Arc<dyn JsonTransport>,
        store: Arc<dyn TokenStore>,
        display: Arc<dyn StatusDisplay>,
    ) -> Self {
        let auth = DeviceCodeAuth::new(transport.clone())
            .with_authority(config.authority.as_str())
            .with_scopes(config.scopes.as_str());
        let presence = PresenceClient::new(transport).with_url(config.presence_url.as_str());
        Self {
            config,
            auth,
            presence,
            store,
            display,
            state: MachineState::new(),
            tokens: None,
            login: None,
            snapshot: None,
            events: VecDeque::new(),
            last_status: None,
        }
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.state.current
    }

    pub fn tokens(&self) -> Option<&TokenBundle> {
        self.tokens.as_ref()
    }

    pub fn snapshot(&self) -> Option<&PresenceSnapshot> {
        self.snapshot.as_ref()
    }

    /// Prompt for the device login in progress, if any.
    pub fn pending_login(&self) -> Option<DeviceLoginPrompt> {
        self.login.as_ref().map(DeviceLoginContext::prompt)
    }

    pub fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    pub fn settings_report(&self) -> SettingsReport {
        self.config.settings_report()
    }

    /// Queue an event for the next tick.
    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Start a device login on request (e.g. from a web handler).
    ///
    /// Performs the device-code request and, on success, schedules the first
    /// token poll one provider interval from `now_ms`.
    pub async fn begin_device_login(&mut self, now_ms: u64) -> Result<DeviceLoginPrompt> {
        match self.state.current {
            LifecycleState::Idle => return Err(LightError::NotConnected),
            LifecycleState::DeviceLoginStarted => return Err(LightError::LoginAlreadyRunning),
            _ => {}
        }
        if !self.config.has_credentials() {
            return Err(LightError::Configuration(
                "client id and tenant are required for device login".to_string(),
            ));
        }
        let prompt = self.start_login(now_ms).await?;
        self.run_entry(now_ms);
        Ok(prompt)
    }

    /// Advance the machine. Returns after at most one network request.
    pub async fn tick(&mut self, now_ms: u64) {
        while let Some(event) = self.events.pop_front() {
            self.apply_event(event, now_ms);
        }

        let mut network_used = false;
        for _ in 0..MAX_STEPS_PER_TICK {
            self.run_entry(now_ms);
            match self.step(now_ms, &mut network_used).await {
                Step::Continue => continue,
                Step::Wait => break,
            }
        }
    }

    fn apply_event(&mut self, event: Event, now_ms: u64) {
        debug!(?event, state = %self.state.current, "Event");
        match event {
            Event::AccessPointMode => self.report(Status::AccessPointMode),
            Event::Connecting => self.report(Status::WifiConnecting),
            Event::ConnectivityEstablished => {
                if self.state.current == LifecycleState::Idle {
                    self.transition(LifecycleState::Connected, Some(now_ms));
                }
            }
            Event::ClearSession => {
                if let Err(err) = self.store.clear() {
                    warn!(error = %err, "Failed to clear stored session");
                }
                self.tokens = None;
                self.login = None;
                self.snapshot = None;
                self.state.failures = 0;
                info!("Session cleared");
                if self.state.current != LifecycleState::Idle {
                    self.transition(LifecycleState::Connected, Some(now_ms));
                    self.state.previous = None;
                }
            }
        }
    }

    fn transition(&mut self, next: LifecycleState, deadline_ms: Option<u64>) {
        if let Some(deadline) = deadline_ms {
            self.state.next_action_at_ms = deadline;
        }
        self.state.current = next;
    }

    /// Send a status to the display unless it is already showing it.
    fn report(&mut self, status: Status) {
        if self.last_status == Some(status) {
            return;
        }
        self.last_status = Some(status);
        self.display.show(status);
    }

    /// Run entry effects until the current state has been entered.
    /// Restoring a session on `Connected` moves straight on to `RefreshToken`.
    fn run_entry(&mut self, now_ms: u64) {
        while self.state.needs_entry() {
            let from = self.state.previous;
            let to = self.state.current;
            self.state.previous = Some(to);
            info!(from = ?from, to = %to, failures = self.state.failures, "==== State change ====");

            match to {
                LifecycleState::Idle => self.report(Status::StartingUp),
                LifecycleState::Connected => {
                    self.report(Status::WifiConnected);
                    self.restore_session(now_ms);
                }
                LifecycleState::DeviceLoginStarted => self.report(Status::DeviceLoginStarted),
                LifecycleState::DeviceLoginFailed => self.report(Status::Error),
                LifecycleState::PollPresence => {
                    // Retrying after an error stays within the same polling episode.
                    if from != Some(LifecycleState::PresenceError) {
                        self.report(Status::Polling);
                    }
                }
                LifecycleState::RefreshToken => self.report(Status::TokenRefreshing),
                LifecycleState::AuthReady | LifecycleState::PresenceError => {}
            }
        }
    }

    fn restore_session(&mut self, now_ms: u64) {
        match self.store.load() {
            Ok(Some(bundle)) => {
                info!("Stored session found");
                self.tokens = Some(bundle);
            }
            Ok(None) => debug!("No stored session"),
            Err(err) => warn!(error = %err, "Failed to load stored session"),
        }
        let has_session = self.tokens.as_ref().is_some_and(TokenBundle::is_complete);
        if has_session && self.config.has_credentials() {
            info!("Refreshing restored session");
            self.transition(LifecycleState::RefreshToken, Some(now_ms));
        } else if has_session {
            warn!("Session available but client id or tenant missing");
        }
    }

    async fn start_login(&mut self, now_ms: u64) -> std::result::Result<DeviceLoginPrompt, AuthError> {
        let context = self
            .auth
            .start_device_login(&self.config.client_id, &self.config.tenant)
            .await?;
        let prompt = context.prompt();
        let first_poll = now_ms.saturating_add(context.interval_ms());
        self.login = Some(context);
        self.transition(LifecycleState::DeviceLoginStarted, Some(first_poll));
        Ok(prompt)
    }

    async fn step(&mut self, now_ms: u64, network_used: &mut bool) -> Step {
        match self.state.current {
            LifecycleState::Idle => Step::Wait,
            LifecycleState::Connected => self.step_connected(now_ms, network_used).await,
            LifecycleState::DeviceLoginStarted => self.step_poll_token(now_ms, network_used).await,
            LifecycleState::DeviceLoginFailed => {
                warn!("Device login failed");
                self.transition(LifecycleState::Connected, Some(now_ms));
                Step::Continue
            }
            LifecycleState::AuthReady => {
                self.persist_session();
                self.state.failures = 0;
                self.transition(LifecycleState::PollPresence, Some(now_ms));
                Step::Continue
            }
            LifecycleState::PollPresence => self.step_poll_presence(now_ms, network_used).await,
            LifecycleState::RefreshToken => self.step_refresh(now_ms, network_used).await,
            LifecycleState::PresenceError => {
                warn!(
                    failures = self.state.failures,
                    threshold = self.config.failure_threshold,
                    "Polling presence failed"
                );
                if self.state.failures >= self.config.failure_threshold {
                    self.state.failures = 0;
                    self.transition(LifecycleState::RefreshToken, Some(now_ms));
                } else {
                    self.transition(LifecycleState::PollPresence, None);
                }
                Step::Continue
            }
        }
    }

    async fn step_connected(&mut self, now_ms: u64, network_used: &mut bool) -> Step {
        let wants_login = self.config.auto_device_login
            && self.config.has_credentials()
            && !self.tokens.as_ref().is_some_and(TokenBundle::is_complete);
        if !wants_login || !self.state.is_due(now_ms) || *network_used {
            return Step::Wait;
        }
        *network_used = true;
        match self.start_login(now_ms).await {
            Ok(prompt) => {
                info!(message = %prompt.message, "Automatic device login started");
                Step::Continue
            }
            Err(err) => {
                warn!(error = %err, "Automatic device login could not start");
                self.state.next_action_at_ms = now_ms.saturating_add(self.error_retry_ms());
                Step::Wait
            }
        }
    }

    async fn step_poll_token(&mut self, now_ms: u64, network_used: &mut bool) -> Step {
        if !self.state.is_due(now_ms) || *network_used {
            return Step::Wait;
        }
        let Some(context) = self.login.as_ref() else {
            self.transition(LifecycleState::DeviceLoginFailed, None);
            return Step::Continue;
        };
        *network_used = true;
        let interval_ms = context.interval_ms();
        let result = self
            .auth
            .poll_for_token(
                &self.config.client_id,
                &self.config.tenant,
                &context.device_code,
                now_ms,
            )
            .await;

        match result {
            Ok(PollResult::Pending { .. }) => {
                self.state.next_action_at_ms = now_ms.saturating_add(interval_ms);
                Step::Wait
            }
            Ok(PollResult::Granted(bundle)) => {
                self.tokens = Some(bundle);
                self.login = None;
                self.transition(LifecycleState::AuthReady, None);
                Step::Continue
            }
            Ok(PollResult::Denied { error, description }) => {
                warn!(%error, %description, "Device login denied");
                self.login = None;
                self.transition(LifecycleState::DeviceLoginFailed, None);
                Step::Continue
            }
            Err(err) => {
                warn!(error = %err, "Token poll failed");
                self.login = None;
                self.transition(LifecycleState::DeviceLoginFailed, None);
                Step::Continue
            }
        }
    }

    async fn step_poll_presence(&mut self, now_ms: u64, network_used: &mut bool) -> Step {
        let Some(tokens) = self.tokens.as_ref() else {
            self.transition(LifecycleState::Connected, Some(now_ms));
            return Step::Continue;
        };
        let lookahead_ms = self.config.refresh_lookahead().as_millis() as u64;
        if tokens.expires_within(now_ms, lookahead_ms) {
            info!(lifetime_secs = tokens.lifetime_secs(now_ms), "Token needs refresh");
            self.transition(LifecycleState::RefreshToken, Some(now_ms));
            return Step::Continue;
        }
        if !self.state.is_due(now_ms) || *network_used {
            return Step::Wait;
        }

        *network_used = true;
        debug!(lifetime_secs = tokens.lifetime_secs(now_ms), "Polling presence");
        let result = self.presence.fetch(&tokens.access_token).await;
        let next_poll = now_ms.saturating_add(self.config.poll_interval().as_millis() as u64);

        match result {
            Ok(snapshot) => {
                info!(
                    availability = %snapshot.availability,
                    activity = %snapshot.activity,
                    "Presence"
                );
                let status = Status::from(&snapshot.activity);
                self.snapshot = Some(snapshot);
                self.state.failures = 0;
                self.state.next_action_at_ms = next_poll;
                self.report(status);
                Step::Wait
            }
            Err(FetchError::InvalidToken(message)) => {
                info!(%message, "Access token rejected, refreshing");
                self.transition(LifecycleState::RefreshToken, Some(now_ms));
                Step::Continue
            }
            Err(err) => {
                self.state.failures += 1;
                warn!(error = %err, failures = self.state.failures, "Presence request failed");
                self.transition(LifecycleState::PresenceError, Some(next_poll));
                Step::Continue
            }
        }
    }

    async fn step_refresh(&mut self, now_ms: u64, network_used: &mut bool) -> Step {
        let Some(current) = self.tokens.as_ref().filter(|t| !t.refresh_token.is_empty()) else {
            warn!("No session to refresh");
            self.tokens = None;
            self.transition(LifecycleState::Connected, Some(now_ms));
            return Step::Continue;
        };
        if !self.state.is_due(now_ms) || *network_used {
            return Step::Wait;
        }

        *network_used = true;
        let result = self
            .auth
            .refresh(&self.config.client_id, &self.config.tenant, current, now_ms)
            .await;
        match result {
            Ok(mut bundle) => {
                let lookahead_ms = self.config.refresh_lookahead().as_millis() as u64;
                if bundle.expires_within(now_ms, lookahead_ms) {
                    // Short-lived grant: poll at least once before refreshing again.
                    let poll_ms = self.config.poll_interval().as_millis() as u64;
                    warn!(
                        lifetime_secs = bundle.lifetime_secs(now_ms),
                        "Refreshed token already inside the refresh window"
                    );
                    bundle.expires_at_ms = now_ms.saturating_add(poll_ms + lookahead_ms + 1);
                }
                self.tokens = Some(bundle);
                self.persist_session();
                self.state.failures = 0;
                self.transition(LifecycleState::PollPresence, Some(now_ms));
                Step::Continue
            }
            Err(err) => {
                let retry_at = now_ms.saturating_add(self.error_retry_ms());
                warn!(error = %err, retry_at_ms = retry_at, "Token refresh failed");
                self.state.next_action_at_ms = retry_at;
                Step::Wait
            }
        }
    }

    fn persist_session(&self) {
        let Some(tokens) = self.tokens.as_ref() else {
            return;
        };
        if let Err(err) = self.store.save(tokens) {
            warn!(error = %err, "Failed to persist session");
        }
    }

    fn error_retry_ms(&self) -> u64 {
        self.config.error_retry().as_millis() as u64
    }
}
