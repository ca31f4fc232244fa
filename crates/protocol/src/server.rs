//! Server → Client messages

use serde::{Deserialize, Serialize};

use crate::types::{DirectoryList, ServerInfo};

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    DirectoryList(DirectoryList),
    ServerReady(ServerInfo),
}
