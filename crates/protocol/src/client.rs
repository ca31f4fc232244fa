//! Client → Server messages

use serde::{Deserialize, Serialize};

use crate::types::SelectDirectory;
use crate::Envelope;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    SelectDirectory(SelectDirectory),
}

impl ClientMessage {
    pub fn select_directory(path: impl Into<String>) -> Self {
        ClientMessage::SelectDirectory(SelectDirectory { path: path.into() })
    }

    pub fn to_envelope(&self) -> Result<Envelope, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::ClientMessage;
    use crate::SELECT_DIRECTORY;

    #[test]
    fn select_directory_wire_shape() {
        let msg = ClientMessage::select_directory("/home/me/src/orca");
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"type":"selectDirectory","data":{"path":"/home/me/src/orca"}})
        );
    }

    #[test]
    fn envelope_keeps_tag_and_payload() {
        let envelope = ClientMessage::select_directory("/srv/app")
            .to_envelope()
            .expect("envelope");
        assert_eq!(envelope.kind, SELECT_DIRECTORY);
        assert_eq!(envelope.data["path"], "/srv/app");
    }
}
