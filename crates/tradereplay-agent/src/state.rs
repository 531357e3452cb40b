//! Content agent connection state.

/// Idle → Connecting → Connected, or Connecting → Backoff(k) → Connecting
/// until the attempt budget runs out, then GaveUp. Only a manual reconnect
/// leaves GaveUp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    /// Waiting before reconnect attempt `attempt`.
    Backoff { attempt: u32 },
    GaveUp,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}
