//! Session handoff: the slot that holds the active session descriptor.

use std::sync::Arc;

use orca_protocol::ServerInfo;
use tokio::sync::watch;
use tracing::info;

/// What a handoff did to the slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handoff {
    /// First descriptor for this connection
    Started { session_id: String },
    /// A later `serverReady` overwrote the descriptor
    Replaced {
        previous_session_id: String,
        session_id: String,
    },
}

/// Holds the nullable session descriptor. Descriptors are shared as
/// `Arc<ServerInfo>` and never mutated in place.
#[derive(Debug)]
pub struct SessionSlot {
    tx: watch::Sender<Option<Arc<ServerInfo>>>,
}

impl Default for SessionSlot {
    fn default() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }
}

impl SessionSlot {
    pub fn current(&self) -> Option<Arc<ServerInfo>> {
        self.tx.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ServerInfo>>> {
        self.tx.subscribe()
    }

    /// Install `info` as the active descriptor. Last write wins.
    pub fn handoff(&self, info: ServerInfo) -> Handoff {
        let session_id = info.session_id.clone();
        let previous = self.tx.send_replace(Some(Arc::new(info)));

        match previous {
            None => {
                info!(
                    component = "handoff",
                    event = "session.ready",
                    session_id = %session_id,
                    "Session descriptor received"
                );
                Handoff::Started { session_id }
            }
            Some(previous) => {
                info!(
                    component = "handoff",
                    event = "session.replaced",
                    previous_session_id = %previous.session_id,
                    session_id = %session_id,
                    "Session descriptor replaced by a later serverReady"
                );
                Handoff::Replaced {
                    previous_session_id: previous.session_id.clone(),
                    session_id,
                }
            }
        }
    }

    /// Drop the descriptor, e.g. when directory selection restarts.
    pub fn clear(&self) -> Option<Arc<ServerInfo>> {
        self.tx.send_replace(None)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn server_info(session_id: &str) -> ServerInfo {
        ServerInfo {
            url: "http://127.0.0.1:4096".to_string(),
            directory: "/src/app".to_string(),
            share_url: format!("https://share.example/s/{session_id}"),
            session_id: session_id.to_string(),
            current_model: "openai/gpt-5".to_string(),
            current_agent: "build".to_string(),
            models: vec!["openai/gpt-5".to_string()],
            agents: Vec::new(),
        }
    }

    #[test]
    fn first_handoff_starts_session() {
        let slot = SessionSlot::default();
        assert!(!slot.is_active());

        let outcome = slot.handoff(server_info("ses_1"));
        assert_eq!(
            outcome,
            Handoff::Started {
                session_id: "ses_1".into()
            }
        );
        assert_eq!(slot.current().unwrap().session_id, "ses_1");
    }

    #[test]
    fn later_handoff_replaces_without_merge() {
        let slot = SessionSlot::default();
        slot.handoff(server_info("ses_1"));

        let mut second = server_info("ses_2");
        second.models.clear();
        let outcome = slot.handoff(second.clone());

        assert_eq!(
            outcome,
            Handoff::Replaced {
                previous_session_id: "ses_1".into(),
                session_id: "ses_2".into()
            }
        );
        assert_eq!(*slot.current().unwrap(), second);
    }

    #[test]
    fn subscribers_see_handoff() {
        let slot = SessionSlot::default();
        let mut rx = slot.subscribe();
        slot.handoff(server_info("ses_9"));

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.unwrap().session_id, "ses_9");
    }

    #[test]
    fn clear_empties_slot() {
        let slot = SessionSlot::default();
        slot.handoff(server_info("ses_1"));
        assert!(slot.clear().is_some());
        assert!(slot.current().is_none());
    }
}
