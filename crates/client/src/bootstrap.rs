//! Directory bootstrap
//!
//! Drives one connection from "unconnected" to "bound to a session":
//! receive the directory catalog, send the chosen directory, wait for the
//! session descriptor. Everything runs on the caller's task; inbound frames
//! are dispatched one at a time in arrival order.

use std::sync::Arc;
use std::time::Duration;

use orca_protocol::{ClientMessage, DirectoryInfo, ServerInfo, DIRECTORY_LIST};
use tracing::{debug, info, warn};
use url::Url;

use crate::connection::ConnectionManager;
use crate::dispatch::{Dispatch, Dispatcher};
use crate::error::{BootstrapError, ConnectionError};
use crate::handoff::SessionSlot;
use crate::state::ConnectionState;

/// Client-side state the dispatcher writes into
#[derive(Debug, Default)]
pub struct BootstrapState {
    directories: Vec<DirectoryInfo>,
    catalog_received: bool,
    session: SessionSlot,
}

impl BootstrapState {
    /// Catalog in server-sent order.
    pub fn directories(&self) -> &[DirectoryInfo] {
        &self.directories
    }

    pub fn has_catalog(&self) -> bool {
        self.catalog_received
    }

    pub fn replace_catalog(&mut self, directories: Vec<DirectoryInfo>) {
        self.directories = directories;
        self.catalog_received = true;
    }

    pub fn session(&self) -> &SessionSlot {
        &self.session
    }
}

/// What a front-end should show, derived from connection state, the pending
/// selection and the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Connecting,
    Closed,
    SelectingDirectory,
    StartingSession,
    SessionActive,
}

pub fn view_phase(
    connection: ConnectionState,
    selection_pending: bool,
    session_active: bool,
) -> ViewPhase {
    match connection {
        ConnectionState::Disconnected | ConnectionState::Connecting => ViewPhase::Connecting,
        ConnectionState::Closed => ViewPhase::Closed,
        ConnectionState::Connected if session_active => ViewPhase::SessionActive,
        ConnectionState::Connected if selection_pending => ViewPhase::StartingSession,
        ConnectionState::Connected => ViewPhase::SelectingDirectory,
    }
}

pub struct Bootstrap {
    connection: ConnectionManager,
    dispatcher: Dispatcher,
    state: BootstrapState,
    selected: Option<String>,
}

impl Bootstrap {
    pub fn new(connection: ConnectionManager) -> Self {
        Self::with_dispatcher(connection, Dispatcher::default())
    }

    pub fn with_dispatcher(connection: ConnectionManager, dispatcher: Dispatcher) -> Self {
        Self {
            connection,
            dispatcher,
            state: BootstrapState::default(),
            selected: None,
        }
    }

    /// Open the socket for `origin` and return the running bootstrap.
    pub fn connect(origin: &Url) -> Result<Self, BootstrapError> {
        let mut connection = ConnectionManager::new(origin)?;
        connection.open()?;
        Ok(Self::new(connection))
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    pub fn directories(&self) -> &[DirectoryInfo] {
        self.state.directories()
    }

    pub fn session(&self) -> Option<Arc<ServerInfo>> {
        self.state.session().current()
    }

    /// Path sent with the last accepted `selectDirectory`.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn view(&self) -> ViewPhase {
        view_phase(
            self.connection.state(),
            self.selected.is_some(),
            self.state.session().is_active(),
        )
    }

    /// Receive and dispatch one inbound frame. `None` once the connection
    /// has closed or been torn down.
    pub async fn next(&mut self) -> Option<Dispatch> {
        let raw = self.connection.recv().await?;
        Some(self.dispatcher.dispatch(&mut self.state, &raw))
    }

    /// Wait until the first directory catalog has arrived.
    pub async fn wait_for_catalog(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<&[DirectoryInfo], BootstrapError> {
        const WAITING_FOR: &str = "the directory list";

        let wait = async {
            while !self.state.has_catalog() {
                match self.next().await {
                    Some(outcome) if outcome.is_applied(DIRECTORY_LIST) => break,
                    Some(_) => continue,
                    None => return Err(BootstrapError::ConnectionClosed(WAITING_FOR)),
                }
            }
            Ok(())
        };
        with_timeout(WAITING_FOR, timeout, wait).await?;
        Ok(self.state.directories())
    }

    /// Send the chosen directory. Fire-and-forget: there is no acknowledgement,
    /// success shows up later as a `serverReady`. Returns whether the message
    /// went out; while not connected the selection is dropped, not queued.
    pub fn select_directory(&mut self, path: &str) -> bool {
        if !self.connection.state().is_connected() {
            debug!(
                component = "bootstrap",
                event = "bootstrap.select_dropped",
                path = %path,
                state = %self.connection.state(),
                "Directory selection dropped, socket not connected"
            );
            return false;
        }

        let sent = ClientMessage::select_directory(path)
            .to_envelope()
            .map_err(ConnectionError::from)
            .and_then(|envelope| self.connection.send(&envelope));
        match sent {
            Ok(()) => {
                info!(
                    component = "bootstrap",
                    event = "bootstrap.directory_selected",
                    path = %path,
                    "Directory selection sent"
                );
                self.selected = Some(path.to_string());
                true
            }
            Err(e) => {
                warn!(
                    component = "bootstrap",
                    event = "bootstrap.select_failed",
                    path = %path,
                    error = %e,
                    "Directory selection not sent"
                );
                false
            }
        }
    }

    /// Wait for the session descriptor.
    ///
    /// `timeout: None` waits as long as the socket stays open. On expiry the
    /// connection is left open; a late `serverReady` is still applied by the
    /// next call.
    pub async fn wait_for_session(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Arc<ServerInfo>, BootstrapError> {
        const WAITING_FOR: &str = "the session to start";

        let wait = async {
            loop {
                if let Some(session) = self.state.session().current() {
                    return Ok(session);
                }
                if self.next().await.is_none() {
                    return Err(BootstrapError::ConnectionClosed(WAITING_FOR));
                }
            }
        };
        with_timeout(WAITING_FOR, timeout, wait).await
    }

    /// Forget the session and the pending selection so another directory can
    /// be chosen on the same connection.
    pub fn restart_selection(&mut self) -> Option<Arc<ServerInfo>> {
        self.selected = None;
        self.state.session().clear()
    }

    /// Scoped teardown of the underlying connection.
    pub fn close(&mut self) {
        self.connection.close();
    }
}

async fn with_timeout<T>(
    waiting_for: &'static str,
    timeout: Option<Duration>,
    wait: impl std::future::Future<Output = Result<T, BootstrapError>>,
) -> Result<T, BootstrapError> {
    match timeout {
        Some(after) => tokio::time::timeout(after, wait)
            .await
            .map_err(|_| BootstrapError::Timeout { waiting_for, after })?,
        None => wait.await,
    }
}
