//! Protocol dispatcher
//!
//! Decodes raw socket frames into envelopes and routes them by tag through a
//! table of handlers. Anything that does not decode, or whose tag has no
//! handler, is dropped without touching state.

use std::collections::HashMap;

use orca_protocol::{DirectoryList, Envelope, ServerInfo, DIRECTORY_LIST, SERVER_READY};
use tracing::{debug, info};

use crate::bootstrap::BootstrapState;

/// A route: applies one envelope's payload to the bootstrap state.
pub type Handler = fn(&mut BootstrapState, &Envelope) -> Result<(), serde_json::Error>;

/// Result of dispatching one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Applied(String),
    Ignored(Ignored),
}

impl Dispatch {
    pub fn is_applied(&self, tag: &str) -> bool {
        matches!(self, Dispatch::Applied(applied) if applied == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ignored {
    /// Not JSON, or JSON without a string `type`
    Unparseable,
    UnknownType(String),
    /// Known tag, payload of the wrong shape
    MalformedPayload(String),
}

pub struct Dispatcher {
    routes: HashMap<&'static str, Handler>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher.register(DIRECTORY_LIST, apply_directory_list);
        dispatcher.register(SERVER_READY, apply_server_ready);
        dispatcher
    }
}

impl Dispatcher {
    /// A dispatcher with no routes.
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Add or replace the handler for `tag`. Returns the previous handler.
    pub fn register(&mut self, tag: &'static str, handler: Handler) -> Option<Handler> {
        self.routes.insert(tag, handler)
    }

    pub fn dispatch(&self, state: &mut BootstrapState, raw: &str) -> Dispatch {
        let envelope: Envelope = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(
                    component = "dispatch",
                    event = "dispatch.parse_failed",
                    error = %e,
                    payload_bytes = raw.len(),
                    payload_preview = %truncate_for_log(raw, 240),
                    "Dropping unparseable frame"
                );
                return Dispatch::Ignored(Ignored::Unparseable);
            }
        };

        let Some(handler) = self.routes.get(envelope.kind.as_str()) else {
            debug!(
                component = "dispatch",
                event = "dispatch.unknown_type",
                message_type = %envelope.kind,
                "Ignoring message with unknown type"
            );
            return Dispatch::Ignored(Ignored::UnknownType(envelope.kind));
        };

        match handler(state, &envelope) {
            Ok(()) => Dispatch::Applied(envelope.kind),
            Err(e) => {
                debug!(
                    component = "dispatch",
                    event = "dispatch.payload_invalid",
                    message_type = %envelope.kind,
                    error = %e,
                    "Dropping message with malformed payload"
                );
                Dispatch::Ignored(Ignored::MalformedPayload(envelope.kind))
            }
        }
    }
}

fn apply_directory_list(
    state: &mut BootstrapState,
    envelope: &Envelope,
) -> Result<(), serde_json::Error> {
    let list: DirectoryList = envelope.payload()?;
    info!(
        component = "dispatch",
        event = "bootstrap.directory_list",
        count = list.directories.len(),
        "Directory catalog received"
    );
    state.replace_catalog(list.directories);
    Ok(())
}

fn apply_server_ready(
    state: &mut BootstrapState,
    envelope: &Envelope,
) -> Result<(), serde_json::Error> {
    let info: ServerInfo = envelope.payload()?;
    state.session().handoff(info);
    Ok(())
}

fn truncate_for_log(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
