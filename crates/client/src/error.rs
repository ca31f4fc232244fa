use std::time::Duration;

use thiserror::Error;

/// Errors building socket or API addresses from the server origin
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Unsupported server URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Server URL cannot be used as a base: {0}")]
    NotABase(String),
}

/// Errors from the connection manager
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection was already opened")]
    AlreadyOpened,

    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] EndpointError),

    #[error("JSON serialization error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors from the directory bootstrap
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Connection closed before {0}")]
    ConnectionClosed(&'static str),

    #[error("Timed out after {after:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: &'static str,
        after: Duration,
    },
}

/// Errors from session commands
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] EndpointError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Session API returned {status}: {body}")]
    Status { status: u16, body: String },
}
