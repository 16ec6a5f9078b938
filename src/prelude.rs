//! Convenience re-exports for common use.

pub use crate::auth::{DeviceCodeAuth, FileTokenStore, TokenBundle, TokenStore};
pub use crate::config::PresenceConfig;
pub use crate::error::{LightError, Result};
pub use crate::machine::{Event, LifecycleState, PresenceMachine};
pub use crate::presence::{Activity, Availability, PresenceSnapshot};
pub use crate::status::{Status, StatusDisplay, TracingDisplay};
pub use crate::transport::{JsonTransport, ReqwestTransport};
pub use crate::util::{Clock, MonotonicClock};
