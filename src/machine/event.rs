/// External notifications consumed at the top of each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The configuration portal opened its own access point.
    AccessPointMode,
    /// The network layer is trying to join the configured network.
    Connecting,
    ConnectivityEstablished,
    /// Forget the stored session and start over.
    ClearSession,
}
