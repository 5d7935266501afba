//! Connection lifecycle states.

/// Lifecycle state of the client's connection.
///
/// A connection attempt moves `Disconnected` → `Connecting` →
/// `HandshakeInFlight` → `Open`. Any failure returns to `Disconnected`, from
/// which the reconnect timer re-enters `Connecting`. An explicit close passes
/// through `Closing` into `PermanentlyClosed`, the only true terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum LinkState {
    /// No connection; a reconnect may be pending.
    #[default]
    Disconnected,
    /// Transport connect in flight.
    Connecting,
    /// Connected; HTTP upgrade exchange in flight.
    HandshakeInFlight,
    /// Handshake accepted; frames flow.
    Open,
    /// Local close frame sent, awaiting flush.
    Closing,
    /// Explicitly closed; the client will never reconnect.
    PermanentlyClosed,
}

impl LinkState {
    /// Check if sending data is allowed in this state.
    #[must_use]
    #[inline]
    pub const fn can_send(&self) -> bool {
        matches!(self, LinkState::Open)
    }

    /// Check if a new connection attempt may begin from this state.
    #[must_use]
    #[inline]
    pub const fn can_connect(&self) -> bool {
        matches!(self, LinkState::Disconnected)
    }

    /// Check if this is the terminal state.
    #[must_use]
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, LinkState::PermanentlyClosed)
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LinkState::Disconnected => "Disconnected",
            LinkState::Connecting => "Connecting",
            LinkState::HandshakeInFlight => "HandshakeInFlight",
            LinkState::Open => "Open",
            LinkState::Closing => "Closing",
            LinkState::PermanentlyClosed => "PermanentlyClosed",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert_eq!(LinkState::default(), LinkState::Disconnected);
    }

    #[test]
    fn test_can_send_only_when_open() {
        assert!(LinkState::Open.can_send());
        for state in [
            LinkState::Disconnected,
            LinkState::Connecting,
            LinkState::HandshakeInFlight,
            LinkState::Closing,
            LinkState::PermanentlyClosed,
        ] {
            assert!(!state.can_send(), "{state} should not allow send");
        }
    }

    #[test]
    fn test_can_connect_only_when_disconnected() {
        assert!(LinkState::Disconnected.can_connect());
        assert!(!LinkState::Open.can_connect());
        assert!(!LinkState::PermanentlyClosed.can_connect());
    }

    #[test]
    fn test_terminal_state() {
        assert!(LinkState::PermanentlyClosed.is_terminal());
        assert!(!LinkState::Disconnected.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(LinkState::Open.to_string(), "Open");
        assert_eq!(
            LinkState::PermanentlyClosed.to_string(),
            "PermanentlyClosed"
        );
    }
}
