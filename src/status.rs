//! Logical status values handed to the display collaborator.

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::info;

use crate::presence::Activity;

/// Everything the indicator can show. Lifecycle statuses come first,
/// presence-derived ones after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    StartingUp,
    AccessPointMode,
    WifiConnecting,
    WifiConnected,
    DeviceLoginStarted,
    TokenRefreshing,
    Polling,
    /// Transient failure, e.g. a device login that was rejected.
    Error,
    Available,
    Away,
    BeRightBack,
    Busy,
    DoNotDisturb,
    InACall,
    InAConferenceCall,
    Inactive,
    InAMeeting,
    Offline,
    Presenting,
    Unknown,
}

impl Status {
    /// Whether this status reflects the user's presence rather than the
    /// device lifecycle.
    pub fn is_presence(self) -> bool {
        matches!(
            self,
            Self::Available
                | Self::Away
                | Self::BeRightBack
                | Self::Busy
                | Self::DoNotDisturb
                | Self::InACall
                | Self::InAConferenceCall
                | Self::Inactive
                | Self::InAMeeting
                | Self::Offline
                | Self::Presenting
                | Self::Unknown
        )
    }
}

impl From<&Activity> for Status {
    fn from(activity: &Activity) -> Self {
        match activity {
            Activity::Available => Self::Available,
            Activity::Away => Self::Away,
            Activity::BeRightBack => Self::BeRightBack,
            Activity::Busy => Self::Busy,
            Activity::DoNotDisturb | Activity::UrgentInterruptionsOnly => Self::DoNotDisturb,
            Activity::InACall => Self::InACall,
            Activity::InAConferenceCall => Self::InAConferenceCall,
            Activity::Inactive => Self::Inactive,
            Activity::InAMeeting => Self::InAMeeting,
            Activity::Offline
            | Activity::OffWork
            | Activity::OutOfOffice
            | Activity::PresenceUnknown => Self::Offline,
            Activity::Presenting => Self::Presenting,
            Activity::Other(_) => Self::Unknown,
        }
    }
}

/// Consumer that renders a [`Status`]. The core never addresses pixels.
pub trait StatusDisplay: Send + Sync {
    fn show(&self, status: Status);
}

/// Display that only logs; used when no hardware is attached.
#[derive(Debug, Clone, Default)]
pub struct TracingDisplay {
    led_count: u32,
}

impl TracingDisplay {
    pub fn new(led_count: u32) -> Self {
        Self { led_count }
    }
}

impl StatusDisplay for TracingDisplay {
    fn show(&self, status: Status) {
        info!(%status, leds = self.led_count, "Display status");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_share_a_status() {
        assert_eq!(Status::from(&Activity::UrgentInterruptionsOnly), Status::DoNotDisturb);
        for activity in [
            Activity::Offline,
            Activity::OffWork,
            Activity::OutOfOffice,
            Activity::PresenceUnknown,
        ] {
            assert_eq!(Status::from(&activity), Status::Offline);
        }
    }

    #[test]
    fn unrecognized_activity_maps_to_unknown() {
        let status = Status::from(&Activity::Other("Focusing".to_string()));
        assert_eq!(status, Status::Unknown);
        assert!(status.is_presence());
    }

    #[test]
    fn lifecycle_statuses_are_not_presence() {
        assert!(!Status::TokenRefreshing.is_presence());
        assert!(!Status::StartingUp.is_presence());
    }

    #[test]
    fn status_names_are_snake_case() {
        assert_eq!(Status::InAConferenceCall.to_string(), "in_a_conference_call");
        assert_eq!("device_login_started".parse::<Status>().unwrap(), Status::DeviceLoginStarted);
    }
}
