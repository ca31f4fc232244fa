//! Client settings shared by every front-end.

use std::time::Duration;

use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_SESSION_READY_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin of the Orca backend; the socket and API hang off it
    pub server_url: Url,
    /// Bound on the wait between `selectDirectory` and `serverReady`.
    /// `None` waits for as long as the socket stays open.
    pub session_ready_timeout: Option<Duration>,
    /// Per-request timeout for session commands
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: Url::parse(DEFAULT_SERVER_URL).expect("default server URL is valid"),
            session_ready_timeout: Some(DEFAULT_SESSION_READY_TIMEOUT),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
