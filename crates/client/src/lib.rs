//! Orca Client
//!
//! Bootstraps a remote coding session over the Orca socket and drives it
//! afterwards:
//!
//! 1. [`ConnectionManager`] opens `/ws` and reports its lifecycle.
//! 2. [`Dispatcher`] routes inbound envelopes by type.
//! 3. [`Bootstrap`] receives the directory catalog, sends the selection and
//!    waits for the session descriptor.
//! 4. [`SessionClient`] submits prompts and switches model or agent.

pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod handoff;
pub mod state;
mod transport;

pub use bootstrap::{view_phase, Bootstrap, BootstrapState, ViewPhase};
pub use commands::{CommandStatus, SessionClient};
pub use config::ClientConfig;
pub use connection::ConnectionManager;
pub use dispatch::{Dispatch, Dispatcher, Handler, Ignored};
pub use error::{BootstrapError, CommandError, ConnectionError, EndpointError};
pub use handoff::{Handoff, SessionSlot};
pub use state::ConnectionState;
