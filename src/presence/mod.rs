//! Presence model and the presence endpoint client.

mod client;

pub use client::{FetchError, PresenceClient, DEFAULT_PRESENCE_URL};

use std::fmt;

use serde::Serialize;
use strum::EnumString;

/// Coarse availability reported by the presence service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
pub enum Availability {
    Available,
    AvailableIdle,
    Away,
    BeRightBack,
    Busy,
    BusyIdle,
    DoNotDisturb,
    Offline,
    PresenceUnknown,
    #[strum(default)]
    Other(String),
}

impl Availability {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "Available",
            Self::AvailableIdle => "AvailableIdle",
            Self::Away => "Away",
            Self::BeRightBack => "BeRightBack",
            Self::Busy => "Busy",
            Self::BusyIdle => "BusyIdle",
            Self::DoNotDisturb => "DoNotDisturb",
            Self::Offline => "Offline",
            Self::PresenceUnknown => "PresenceUnknown",
            Self::Other(s) => s,
        }
    }
}

/// Fine-grained activity; this is what drives the indicator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
pub enum Activity {
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
    OffWork,
    OutOfOffice,
    PresenceUnknown,
    Presenting,
    UrgentInterruptionsOnly,
    #[strum(default)]
    Other(String),
}

impl Activity {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "Available",
            Self::Away => "Away",
            Self::BeRightBack => "BeRightBack",
            Self::Busy => "Busy",
            Self::DoNotDisturb => "DoNotDisturb",
            Self::InACall => "InACall",
            Self::InAConferenceCall => "InAConferenceCall",
            Self::Inactive => "Inactive",
            Self::InAMeeting => "InAMeeting",
            Self::Offline => "Offline",
            Self::OffWork => "OffWork",
            Self::OutOfOffice => "OutOfOffice",
            Self::PresenceUnknown => "PresenceUnknown",
            Self::Presenting => "Presenting",
            Self::UrgentInterruptionsOnly => "UrgentInterruptionsOnly",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Availability {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for Activity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Last successfully fetched presence. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceSnapshot {
    pub availability: Availability,
    pub activity: Activity,
}

impl PresenceSnapshot {
    pub fn parse(availability: &str, activity: &str) -> Self {
        // EnumString with a `default` variant never fails.
        Self {
            availability: availability
                .parse()
                .unwrap_or_else(|_| Availability::Other(availability.to_string())),
            activity: activity
                .parse()
                .unwrap_or_else(|_| Activity::Other(activity.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_activities_parse_to_variants() {
        let snapshot = PresenceSnapshot::parse("Busy", "InAConferenceCall");
        assert_eq!(snapshot.availability, Availability::Busy);
        assert_eq!(snapshot.activity, Activity::InAConferenceCall);
    }

    #[test]
    fn unknown_activity_is_kept_verbatim() {
        let snapshot = PresenceSnapshot::parse("Mystery", "Juggling");
        assert_eq!(snapshot.availability, Availability::Other("Mystery".to_string()));
        assert_eq!(snapshot.activity.as_str(), "Juggling");
        assert_eq!(snapshot.activity.to_string(), "Juggling");
    }

    #[test]
    fn snapshot_serializes_as_plain_strings() {
        let snapshot = PresenceSnapshot::parse("Away", "BeRightBack");
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["availability"], "Away");
        assert_eq!(json["activity"], "BeRightBack");
    }
}
