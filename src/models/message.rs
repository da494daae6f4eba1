use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Video,
}

impl Default for MessageKind {
    fn default() -> Self {
        MessageKind::Text
    }
}

/// A persisted chat message. Exactly one of `receiver_id` / `group_id` is set;
/// only direct messages carry seen/delivered flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub body: String,
    pub kind: MessageKind,
    pub media_url: Option<String>,
    pub seen: bool,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn direct(sender_id: Uuid, receiver_id: Uuid, body: String, kind: MessageKind, media_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id: Some(receiver_id),
            group_id: None,
            body,
            kind,
            media_url,
            seen: false,
            delivered: false,
            created_at: Utc::now(),
        }
    }

    pub fn group(sender_id: Uuid, group_id: Uuid, body: String, kind: MessageKind, media_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id: None,
            group_id: Some(group_id),
            body,
            kind,
            media_url,
            seen: false,
            delivered: false,
            created_at: Utc::now(),
        }
    }
}
