use serde::Serialize;
use strum::Display;

/// Lifecycle of the indicator. No other states exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Waiting for network connectivity.
    Idle,
    Connected,
    DeviceLoginStarted,
    DeviceLoginFailed,
    AuthReady,
    PollPresence,
    RefreshToken,
    PresenceError,
}

/// Mutable bookkeeping owned by the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineState {
    pub current: LifecycleState,
    /// State whose entry side effects ran last. `None` until the first tick.
    pub previous: Option<LifecycleState>,
    /// Absolute monotonic deadline for the next unit of work.
    pub next_action_at_ms: u64,
    /// Consecutive presence fetch failures.
    pub failures: u32,
}

impl MachineState {
    pub fn new() -> Self {
        Self {
            current: LifecycleState::Idle,
            previous: None,
            next_action_at_ms: 0,
            failures: 0,
        }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.next_action_at_ms
    }

    pub(crate) fn needs_entry(&self) -> bool {
        self.previous != Some(self.current)
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new()
    }
}
