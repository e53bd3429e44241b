//! HMR wire format: one JSON object per WebSocket text frame.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Server → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Add {
        #[serde(rename = "moduleId")]
        module_id: String,
        hash: String,
    },
    Remove {
        #[serde(rename = "moduleId")]
        module_id: String,
    },
    Update {
        #[serde(rename = "moduleId")]
        module_id: String,
        hash: String,
        #[serde(rename = "updateUrl")]
        update_url: String,
    },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Update { .. } => "update",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Client → server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "hotAccept")]
    HotAccept { id: String },
}

impl ClientMessage {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let message: ClientMessage = serde_json::from_str(text)?;
        match &message {
            ClientMessage::HotAccept { id } if id.is_empty() => Err(ProtocolError::EmptyModuleId),
            _ => Ok(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_message_shapes() {
        let add = ServerMessage::Add { module_id: "/a.js".into(), hash: "h".into() };
        assert_eq!(
            serde_json::to_value(&add).unwrap(),
            json!({"type": "add", "moduleId": "/a.js", "hash": "h"})
        );

        let remove = ServerMessage::Remove { module_id: "/a.js".into() };
        assert_eq!(
            serde_json::to_value(&remove).unwrap(),
            json!({"type": "remove", "moduleId": "/a.js"})
        );

        let update = ServerMessage::Update {
            module_id: "/a.js".into(),
            hash: "h".into(),
            update_url: "/_aleph/a.h.js".into(),
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"type": "update", "moduleId": "/a.js", "hash": "h", "updateUrl": "/_aleph/a.h.js"})
        );
    }

    #[test]
    fn test_parse_hot_accept() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"hotAccept","id":"/pages/index.js"}"#).unwrap(),
            ClientMessage::HotAccept { id: "/pages/index.js".into() }
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(ClientMessage::parse("not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(ClientMessage::parse(r#"{"id":"/a.js"}"#), Err(ProtocolError::Malformed(_))));
        assert!(matches!(ClientMessage::parse(r#"{"type":"ping"}"#), Err(ProtocolError::Malformed(_))));
        assert!(matches!(
            ClientMessage::parse(r#"{"type":"hotAccept","id":""}"#),
            Err(ProtocolError::EmptyModuleId)
        ));
    }
}
