use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Message, MessageKind, UserSummary};
use crate::store::{ConversationStore, GroupStore, MessageStore, Store, UserStore};
use crate::websocket::{events::ServerEvent, ConnectionRegistry};

use super::notify::{NotificationDispatcher, PushJob};

pub const GROUP_PAGE_SIZE: usize = 30;

/// A direct message with both endpoints expanded to display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMessageView {
    pub id: Uuid,
    pub sender: UserSummary,
    pub receiver: UserSummary,
    pub body: String,
    pub kind: MessageKind,
    pub media_url: Option<String>,
    pub seen: bool,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}

/// A group message with the sender expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMessageView {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender: UserSummary,
    pub body: String,
    pub kind: MessageKind,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct GroupHistory {
    pub page: u32,
    pub messages: Vec<GroupMessageView>,
    pub member_count: usize,
}

pub struct MessageService;

impl MessageService {
    /// Persists a direct message and folds it into the pair's conversation:
    /// preview fields move to the new message, the receiver's unread counter
    /// goes up by one and the sender's resets. Both participants get a
    /// `conversation_updated` event; the receiver gets a best-effort push if
    /// they registered a token.
    pub async fn send_direct(
        store: &Store,
        registry: &ConnectionRegistry,
        dispatcher: &NotificationDispatcher,
        sender_id: Uuid,
        receiver_id: Option<Uuid>,
        body: String,
        kind: MessageKind,
        media_url: Option<String>,
    ) -> AppResult<Message> {
        let receiver_id = receiver_id
            .ok_or_else(|| AppError::Validation("receiver required for private chat".into()))?;

        let message = store
            .messages
            .insert(Message::direct(sender_id, receiver_id, body, kind, media_url))
            .await?;

        let mut conversation = store
            .conversations
            .upsert_for_pair(sender_id, receiver_id)
            .await?;
        conversation.last_message = Some(message.body.clone());
        conversation.last_message_kind = message.kind;
        conversation.last_message_at = Some(message.created_at);
        let unread = conversation.unread_for(receiver_id);
        conversation.unread.insert(receiver_id, unread + 1);
        conversation.unread.insert(sender_id, 0);
        store.conversations.save(&conversation).await?;

        registry
            .emit_to_user(receiver_id, ServerEvent::ConversationUpdated)
            .await;
        registry
            .emit_to_user(sender_id, ServerEvent::ConversationUpdated)
            .await;

        if let Some(receiver) = store.users.get(receiver_id).await? {
            if let Some(token) = receiver.push_token {
                let sender_name = store
                    .users
                    .get(sender_id)
                    .await?
                    .map(|s| s.name)
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "New Message".to_string());
                dispatcher.enqueue(PushJob {
                    token,
                    title: sender_name,
                    body: if message.body.is_empty() {
                        "You have a new message".to_string()
                    } else {
                        message.body.clone()
                    },
                    sender_id,
                });
            }
        }

        Ok(message)
    }

    /// Persists a group message and broadcasts it to the group room.
    pub async fn send_group(
        store: &Store,
        registry: &ConnectionRegistry,
        sender_id: Uuid,
        group_id: Uuid,
        body: String,
        kind: MessageKind,
        media_url: Option<String>,
    ) -> AppResult<GroupMessageView> {
        let mut group = store.groups.require(group_id).await?;
        if !group.is_member(sender_id) {
            return Err(AppError::Forbidden("not a group member".into()));
        }

        let message = store
            .messages
            .insert(Message::group(sender_id, group_id, body, kind, media_url))
            .await?;

        group.updated_at = Utc::now();
        store.groups.save(&group).await?;

        let sender = store.users.require(sender_id).await?;
        let view = GroupMessageView {
            id: message.id,
            group_id,
            sender: sender.summary(),
            body: message.body,
            kind: message.kind,
            media_url: message.media_url,
            created_at: message.created_at,
        };

        registry
            .emit_to_group(
                group_id,
                ServerEvent::ReceiveGroupMessage {
                    message: view.clone(),
                },
            )
            .await;

        Ok(view)
    }

    /// Marks every unseen sender->receiver message seen and resets the
    /// receiver's unread counter on the shared conversation. Delivered flags
    /// are never touched retroactively.
    pub async fn mark_seen(store: &Store, sender_id: Uuid, receiver_id: Uuid) -> AppResult<u64> {
        let updated = store.messages.mark_seen(sender_id, receiver_id).await?;

        if let Some(mut conversation) = store
            .conversations
            .find_by_pair(sender_id, receiver_id)
            .await?
        {
            conversation.unread.insert(receiver_id, 0);
            store.conversations.save(&conversation).await?;
        }

        Ok(updated)
    }

    /// Flags unseen sender->receiver messages delivered. Called by the
    /// gateway only while the receiver is online; there is no retroactive
    /// delivery computation on reconnect.
    pub async fn mark_delivered(store: &Store, sender_id: Uuid, receiver_id: Uuid) -> AppResult<u64> {
        store.messages.mark_delivered(sender_id, receiver_id).await
    }

    /// All direct traffic between the two users, oldest first, endpoints
    /// expanded.
    pub async fn history(store: &Store, a: Uuid, b: Uuid) -> AppResult<Vec<DirectMessageView>> {
        let user_a = store.users.require(a).await?;
        let user_b = store.users.require(b).await?;
        let summaries: HashMap<Uuid, UserSummary> =
            HashMap::from([(a, user_a.summary()), (b, user_b.summary())]);

        let messages = store.messages.direct_between(a, b).await?;
        let mut views = Vec::with_capacity(messages.len());
        for m in messages {
            let receiver_id = m.receiver_id.ok_or(AppError::Internal)?;
            views.push(DirectMessageView {
                id: m.id,
                sender: summaries[&m.sender_id].clone(),
                receiver: summaries[&receiver_id].clone(),
                body: m.body,
                kind: m.kind,
                media_url: m.media_url,
                seen: m.seen,
                delivered: m.delivered,
                created_at: m.created_at,
            });
        }
        Ok(views)
    }

    /// One page (30) of a group's messages for a member, fetched newest-first
    /// and reversed to oldest->newest for delivery.
    pub async fn group_history(
        store: &Store,
        group_id: Uuid,
        requester_id: Uuid,
        page: u32,
    ) -> AppResult<GroupHistory> {
        let group = store.groups.require(group_id).await?;
        if !group.is_member(requester_id) {
            return Err(AppError::Forbidden(
                "you are not a member of this group".into(),
            ));
        }

        let page = page.max(1);
        let mut messages = store
            .messages
            .group_page(group_id, page, GROUP_PAGE_SIZE)
            .await?;
        messages.reverse();

        let mut summaries: HashMap<Uuid, UserSummary> = HashMap::new();
        let mut views = Vec::with_capacity(messages.len());
        for m in messages {
            if !summaries.contains_key(&m.sender_id) {
                let sender = store.users.require(m.sender_id).await?;
                summaries.insert(m.sender_id, sender.summary());
            }
            views.push(GroupMessageView {
                id: m.id,
                group_id,
                sender: summaries[&m.sender_id].clone(),
                body: m.body,
                kind: m.kind,
                media_url: m.media_url,
                created_at: m.created_at,
            });
        }

        Ok(GroupHistory {
            page,
            messages: views,
            member_count: group.members.len(),
        })
    }
}
