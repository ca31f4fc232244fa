//! Orca Protocol
//!
//! Shared types for the bootstrap socket between the Orca backend and its
//! clients, plus the request bodies of the per-session command API.
//! Socket traffic is a JSON envelope `{ "type": ..., "data": ... }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod client;
pub mod server;
pub mod types;

pub use client::ClientMessage;
pub use server::ServerMessage;
pub use types::*;

/// Tag of the server's directory catalog message.
pub const DIRECTORY_LIST: &str = "directoryList";
/// Tag of the client's directory choice.
pub const SELECT_DIRECTORY: &str = "selectDirectory";
/// Tag of the terminal bootstrap message carrying the session descriptor.
pub const SERVER_READY: &str = "serverReady";

/// Untyped socket envelope.
///
/// Decoding into this first lets a receiver route on `type` and ignore tags it
/// does not know, instead of failing the whole frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Decode the payload as `T`.
    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}
