//! Socket transport task.
//!
//! One tokio task owns the websocket. Inbound frames and lifecycle changes are
//! forwarded in order as `TransportEvent`s; outbound text is fed in over an
//! unbounded channel. Ownership of the socket never leaves the task.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use url::Url;

/// Lifecycle and data events reported by the transport task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Text(String),
    Error(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outbound {
    Text(String),
    Close,
}

/// Owner's end of a running transport
#[derive(Debug)]
pub(crate) struct TransportHandle {
    pub(crate) outbound: mpsc::UnboundedSender<Outbound>,
}

impl TransportHandle {
    /// Send a close frame and let the task wind down.
    pub(crate) fn close(self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

pub(crate) fn spawn(endpoint: Url, events: mpsc::Sender<TransportEvent>) -> TransportHandle {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    tokio::spawn(run(endpoint, events, outbound_rx));
    TransportHandle {
        outbound: outbound_tx,
    }
}

async fn run(
    endpoint: Url,
    events: mpsc::Sender<TransportEvent>,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
) {
    let stream = match tokio_tungstenite::connect_async(endpoint.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            let _ = events.send(TransportEvent::Error(e.to_string())).await;
            let _ = events.send(TransportEvent::Closed).await;
            return;
        }
    };
    let (mut ws_tx, mut ws_rx) = stream.split();

    // Owner tore down while the handshake was in flight.
    if events.send(TransportEvent::Opened).await.is_err() {
        debug!(
            component = "transport",
            event = "transport.opened_after_teardown",
            endpoint = %endpoint,
            "Socket opened after owner went away, closing"
        );
        let _ = ws_tx.close().await;
        return;
    }

    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if events.send(TransportEvent::Text(text.to_string())).await.is_err() {
                        let _ = ws_tx.close().await;
                        return;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    let _ = events.send(TransportEvent::Error(e.to_string())).await;
                    break;
                }
            },
            outbound = outbound_rx.recv() => match outbound {
                Some(Outbound::Text(json)) => {
                    if let Err(e) = ws_tx.send(Message::Text(json.into())).await {
                        let _ = events.send(TransportEvent::Error(e.to_string())).await;
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = ws_tx.close().await;
                    break;
                }
            },
        }
    }

    let _ = events.send(TransportEvent::Closed).await;
}
