use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::MessageKind;
use crate::services::messages::GroupMessageView;

/// Events a connected client may send over the socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Relay of a freshly persisted direct message to its receiver. The
    /// payload is forwarded as-is; persistence happens on the HTTP path.
    SendMessage {
        receiver_id: Uuid,
        message: serde_json::Value,
    },
    Typing {
        receiver_id: Uuid,
    },
    StopTyping {
        receiver_id: Uuid,
    },
    JoinGroup {
        group_id: Uuid,
    },
    SendGroupMessage {
        group_id: Uuid,
        body: String,
        #[serde(default)]
        kind: MessageKind,
        #[serde(default)]
        media_url: Option<String>,
    },
}

/// Events the gateway emits into rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    ReceiveMessage {
        sender_id: Uuid,
        message: serde_json::Value,
    },
    MessageDelivered {
        receiver_id: Uuid,
    },
    Typing {
        sender_id: Uuid,
    },
    StopTyping {
        sender_id: Uuid,
    },
    ReceiveGroupMessage {
        message: GroupMessageView,
    },
    ConversationUpdated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_use_snake_case_tags() {
        let raw = format!(
            r#"{{"event":"typing","receiver_id":"{}"}}"#,
            Uuid::new_v4()
        );
        assert!(matches!(
            serde_json::from_str::<ClientEvent>(&raw).unwrap(),
            ClientEvent::Typing { .. }
        ));
    }

    #[test]
    fn server_events_serialize_with_event_tag() {
        let json = serde_json::to_value(ServerEvent::ConversationUpdated).unwrap();
        assert_eq!(json["event"], "conversation_updated");
    }
}
