//! Pure connection lifecycle transitions
//!
//! `transition(state, input) -> state` holds every rule of the socket
//! lifecycle. No IO, no async: the connection manager feeds it and publishes
//! the result.

use std::fmt;

/// Lifecycle of one socket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Terminal. A fresh bootstrap needs a fresh manager.
    Closed,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    pub fn is_terminal(self) -> bool {
        self == ConnectionState::Closed
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Things that can happen to a connection. Transport errors are not an input:
/// they never move the state on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Open,
    TransportOpened,
    TransportClosed,
    Close,
}

pub fn transition(state: ConnectionState, input: Input) -> ConnectionState {
    use ConnectionState::*;

    match (state, input) {
        (Disconnected, Input::Open) => Connecting,
        (Connecting, Input::TransportOpened) => Connected,
        (Connecting | Connected, Input::TransportClosed | Input::Close) => Closed,
        (current, _) => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    const ALL_STATES: [ConnectionState; 4] = [Disconnected, Connecting, Connected, Closed];
    const ALL_INPUTS: [Input; 4] = [
        Input::Open,
        Input::TransportOpened,
        Input::TransportClosed,
        Input::Close,
    ];

    #[test]
    fn open_then_transport_open_connects() {
        let state = transition(Disconnected, Input::Open);
        assert_eq!(state, Connecting);
        assert_eq!(transition(state, Input::TransportOpened), Connected);
    }

    #[test]
    fn transport_close_before_open_closes() {
        let state = transition(Disconnected, Input::Open);
        assert_eq!(transition(state, Input::TransportClosed), Closed);
    }

    #[test]
    fn closed_is_terminal() {
        for input in ALL_INPUTS {
            assert_eq!(transition(Closed, input), Closed);
        }
    }

    #[test]
    fn reopen_is_ignored_once_open() {
        assert_eq!(transition(Connecting, Input::Open), Connecting);
        assert_eq!(transition(Connected, Input::Open), Connected);
        assert_eq!(transition(Connected, Input::TransportOpened), Connected);
    }

    #[test]
    fn only_specified_edges_are_reachable() {
        let allowed = [
            (Disconnected, Connecting),
            (Connecting, Connected),
            (Connecting, Closed),
            (Connected, Closed),
        ];
        for state in ALL_STATES {
            for input in ALL_INPUTS {
                let next = transition(state, input);
                if next != state {
                    assert!(
                        allowed.contains(&(state, next)),
                        "unexpected edge {state:?} -> {next:?} on {input:?}"
                    );
                }
            }
        }
    }
}
