use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{MessageKind, UserSummary};
use crate::store::{ConversationStore, Store, UserStore};

#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub id: Uuid,
    pub participants: Vec<UserSummary>,
    pub last_message: Option<String>,
    pub last_message_kind: MessageKind,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread: u32,
}

pub struct ConversationService;

impl ConversationService {
    /// Every conversation the user participates in, identities expanded to
    /// display fields and presence, most recent activity first.
    pub async fn list_conversations(
        store: &Store,
        user_id: Uuid,
    ) -> AppResult<Vec<ConversationView>> {
        let conversations = store.conversations.list_for_user(user_id).await?;

        let mut views = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let mut participants = Vec::with_capacity(2);
            for &participant in &conversation.participants {
                if let Some(user) = store.users.get(participant).await? {
                    participants.push(user.summary());
                }
            }
            views.push(ConversationView {
                id: conversation.id,
                participants,
                last_message: conversation.last_message.clone(),
                last_message_kind: conversation.last_message_kind,
                last_message_at: conversation.last_message_at,
                unread: conversation.unread_for(user_id),
            });
        }
        Ok(views)
    }
}
