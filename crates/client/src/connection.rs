//! Connection manager
//!
//! Owns the socket for one bootstrap. The lifecycle is published through a
//! `watch` channel; inbound frames are handed out one at a time by `recv`, in
//! arrival order. There is no reconnect: once `Closed`, build a new manager.

use orca_protocol::Envelope;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};
use url::Url;

use crate::endpoint::socket_url;
use crate::error::ConnectionError;
use crate::state::{transition, ConnectionState, Input};
use crate::transport::{self, Outbound, TransportEvent, TransportHandle};

const EVENT_BUFFER: usize = 100;

pub struct ConnectionManager {
    endpoint: Url,
    state_tx: watch::Sender<ConnectionState>,
    /// Cleared on teardown; checked before any inbound delivery.
    live: bool,
    events: Option<mpsc::Receiver<TransportEvent>>,
    transport: Option<TransportHandle>,
}

impl ConnectionManager {
    /// Manager for the socket belonging to `origin` (`http(s)://host`).
    pub fn new(origin: &Url) -> Result<Self, ConnectionError> {
        Ok(Self::with_socket_url(socket_url(origin)?))
    }

    pub fn with_socket_url(endpoint: Url) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            endpoint,
            state_tx,
            live: false,
            events: None,
            transport: None,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Observe lifecycle changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Start connecting. Returns a lifecycle observer.
    pub fn open(&mut self) -> Result<watch::Receiver<ConnectionState>, ConnectionError> {
        self.ensure_unopened()?;
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let handle = transport::spawn(self.endpoint.clone(), events_tx);
        self.attach(handle, events_rx)?;
        Ok(self.subscribe())
    }

    pub(crate) fn attach(
        &mut self,
        transport: TransportHandle,
        events: mpsc::Receiver<TransportEvent>,
    ) -> Result<(), ConnectionError> {
        self.ensure_unopened()?;
        self.transport = Some(transport);
        self.events = Some(events);
        self.live = true;
        self.apply(Input::Open);
        info!(
            component = "connection",
            event = "connection.opening",
            endpoint = %self.endpoint,
            "Opening bootstrap socket"
        );
        Ok(())
    }

    fn ensure_unopened(&self) -> Result<(), ConnectionError> {
        if self.state() != ConnectionState::Disconnected || self.transport.is_some() {
            return Err(ConnectionError::AlreadyOpened);
        }
        Ok(())
    }

    /// Queue an envelope for the socket.
    pub fn send(&self, envelope: &Envelope) -> Result<(), ConnectionError> {
        if !self.live || !self.state().is_connected() {
            return Err(ConnectionError::NotConnected);
        }
        let transport = self.transport.as_ref().ok_or(ConnectionError::NotConnected)?;
        let json = serde_json::to_string(envelope)?;
        transport
            .outbound
            .send(Outbound::Text(json))
            .map_err(|_| ConnectionError::NotConnected)?;
        debug!(
            component = "connection",
            event = "connection.send",
            message_type = %envelope.kind,
            "Envelope queued"
        );
        Ok(())
    }

    /// Next inbound text frame, in arrival order. `None` once the connection
    /// is closed or torn down.
    pub async fn recv(&mut self) -> Option<String> {
        loop {
            if !self.live {
                return None;
            }
            let event = match self.events.as_mut() {
                Some(rx) => rx.recv().await,
                None => return None,
            };
            let Some(event) = event else {
                self.handle_event(TransportEvent::Closed);
                return None;
            };
            if let Some(raw) = self.handle_event(event) {
                return Some(raw);
            }
            if self.state().is_terminal() {
                return None;
            }
        }
    }

    /// Apply one transport event. Returns the payload of text frames.
    pub(crate) fn handle_event(&mut self, event: TransportEvent) -> Option<String> {
        if !self.live {
            debug!(
                component = "connection",
                event = "connection.event_after_teardown",
                "Dropping transport event after teardown"
            );
            return None;
        }

        match event {
            TransportEvent::Opened => {
                self.apply(Input::TransportOpened);
                info!(
                    component = "connection",
                    event = "connection.opened",
                    endpoint = %self.endpoint,
                    "Bootstrap socket connected"
                );
                None
            }
            TransportEvent::Text(raw) => Some(raw),
            TransportEvent::Error(error) => {
                // Errors during teardown races are routine; the close event
                // that follows carries the state change.
                debug!(
                    component = "connection",
                    event = "connection.transport_error",
                    error = %error,
                    "Transport error"
                );
                None
            }
            TransportEvent::Closed => {
                self.apply(Input::TransportClosed);
                self.transport = None;
                self.events = None;
                info!(
                    component = "connection",
                    event = "connection.closed",
                    endpoint = %self.endpoint,
                    "Bootstrap socket closed"
                );
                None
            }
        }
    }

    /// Scoped teardown: stop delivery, close the socket if it is open.
    pub fn close(&mut self) {
        let was = self.state();
        self.live = false;
        self.events = None;

        if let Some(transport) = self.transport.take() {
            if was.is_connected() {
                transport.close();
            }
            // A transport still connecting closes itself once it sees the
            // event channel is gone.
        }

        self.apply(Input::Close);
        if was != self.state() {
            info!(
                component = "connection",
                event = "connection.teardown",
                endpoint = %self.endpoint,
                from = %was,
                "Connection torn down"
            );
        }
    }

    fn apply(&mut self, input: Input) {
        let current = self.state();
        let next = transition(current, input);
        if next != current {
            self.state_tx.send_replace(next);
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if self.live || self.transport.is_some() {
            self.close();
        }
    }
}
