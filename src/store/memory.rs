use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::conversation::PairKey;
use crate::models::{Conversation, Group, Message, OtpRecord, User};

use super::{ConversationStore, GroupStore, MessageStore, OtpStore, UserStore};

#[derive(Default)]
pub struct MemoryUsers {
    inner: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn insert(&self, user: User) -> AppResult<User> {
        self.inner.write().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        self.inner.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn list_except(&self, id: Uuid) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self
            .inner
            .read()
            .await
            .values()
            .filter(|u| u.id != id)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }
}

#[derive(Default)]
pub struct MemoryMessages {
    inner: RwLock<Vec<Message>>,
}

#[async_trait]
impl MessageStore for MemoryMessages {
    async fn insert(&self, message: Message) -> AppResult<Message> {
        self.inner.write().await.push(message.clone());
        Ok(message)
    }

    async fn direct_between(&self, a: Uuid, b: Uuid) -> AppResult<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .inner
            .read()
            .await
            .iter()
            .filter(|m| {
                m.group_id.is_none()
                    && ((m.sender_id == a && m.receiver_id == Some(b))
                        || (m.sender_id == b && m.receiver_id == Some(a)))
            })
            .cloned()
            .collect();
        messages.sort_by(|x, y| x.created_at.cmp(&y.created_at));
        Ok(messages)
    }

    async fn group_page(&self, group_id: Uuid, page: u32, limit: usize) -> AppResult<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .inner
            .read()
            .await
            .iter()
            .filter(|m| m.group_id == Some(group_id))
            .cloned()
            .collect();
        messages.sort_by(|x, y| y.created_at.cmp(&x.created_at));
        let skip = page.saturating_sub(1) as usize * limit;
        Ok(messages.into_iter().skip(skip).take(limit).collect())
    }

    async fn mark_seen(&self, sender_id: Uuid, receiver_id: Uuid) -> AppResult<u64> {
        let mut guard = self.inner.write().await;
        let mut updated = 0;
        for m in guard.iter_mut() {
            if m.sender_id == sender_id && m.receiver_id == Some(receiver_id) && !m.seen {
                m.seen = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn mark_delivered(&self, sender_id: Uuid, receiver_id: Uuid) -> AppResult<u64> {
        let mut guard = self.inner.write().await;
        let mut updated = 0;
        for m in guard.iter_mut() {
            if m.sender_id == sender_id && m.receiver_id == Some(receiver_id) && !m.seen && !m.delivered {
                m.delivered = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[derive(Default)]
struct ConversationState {
    by_id: HashMap<Uuid, Conversation>,
    by_pair: HashMap<PairKey, Uuid>,
}

#[derive(Default)]
pub struct MemoryConversations {
    inner: RwLock<ConversationState>,
}

#[async_trait]
impl ConversationStore for MemoryConversations {
    async fn upsert_for_pair(&self, a: Uuid, b: Uuid) -> AppResult<Conversation> {
        let key = PairKey::new(a, b);
        // Single write-lock critical section: lookup and insert cannot
        // interleave with another upsert for the same pair.
        let mut state = self.inner.write().await;
        if let Some(id) = state.by_pair.get(&key) {
            let existing = state.by_id[id].clone();
            return Ok(existing);
        }
        let conversation = Conversation::new(a, b);
        state.by_pair.insert(key, conversation.id);
        state.by_id.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn find_by_pair(&self, a: Uuid, b: Uuid) -> AppResult<Option<Conversation>> {
        let key = PairKey::new(a, b);
        let state = self.inner.read().await;
        Ok(state.by_pair.get(&key).map(|id| state.by_id[id].clone()))
    }

    async fn save(&self, conversation: &Conversation) -> AppResult<()> {
        let mut state = self.inner.write().await;
        state.by_pair.insert(conversation.pair_key(), conversation.id);
        state.by_id.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Conversation>> {
        let state = self.inner.read().await;
        let mut conversations: Vec<Conversation> = state
            .by_id
            .values()
            .filter(|c| c.involves(user_id))
            .cloned()
            .collect();
        conversations.sort_by(|x, y| {
            y.last_message_at
                .unwrap_or(y.created_at)
                .cmp(&x.last_message_at.unwrap_or(x.created_at))
        });
        Ok(conversations)
    }
}

#[derive(Default)]
pub struct MemoryGroups {
    inner: RwLock<HashMap<Uuid, Group>>,
}

#[async_trait]
impl GroupStore for MemoryGroups {
    async fn insert(&self, group: Group) -> AppResult<Group> {
        self.inner.write().await.insert(group.id, group.clone());
        Ok(group)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Group>> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn save(&self, group: &Group) -> AppResult<()> {
        self.inner.write().await.insert(group.id, group.clone());
        Ok(())
    }

    async fn list_for_member(&self, user_id: Uuid) -> AppResult<Vec<Group>> {
        let mut groups: Vec<Group> = self
            .inner
            .read()
            .await
            .values()
            .filter(|g| g.is_member(user_id))
            .cloned()
            .collect();
        groups.sort_by(|x, y| y.updated_at.cmp(&x.updated_at));
        Ok(groups)
    }
}

#[derive(Default)]
pub struct MemoryOtps {
    inner: RwLock<Vec<OtpRecord>>,
}

#[async_trait]
impl OtpStore for MemoryOtps {
    async fn replace_for_email(&self, record: OtpRecord) -> AppResult<()> {
        let mut guard = self.inner.write().await;
        guard.retain(|r| r.email != record.email);
        guard.push(record);
        Ok(())
    }

    async fn find(&self, email: &str, code: &str) -> AppResult<Option<OtpRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .iter()
            .find(|r| r.email == email && r.code == code)
            .cloned())
    }

    async fn delete_for_email(&self, email: &str) -> AppResult<()> {
        self.inner.write().await.retain(|r| r.email != email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageKind;

    #[tokio::test]
    async fn concurrent_upserts_converge_on_one_conversation() {
        let store = std::sync::Arc::new(MemoryConversations::default());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            // Alternate argument order to exercise canonicalization as well
            let (x, y) = if i % 2 == 0 { (a, b) } else { (b, a) };
            handles.push(tokio::spawn(async move { store.upsert_for_pair(x, y).await }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.list_for_user(a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mark_delivered_skips_seen_messages() {
        let store = MemoryMessages::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut seen = Message::direct(a, b, "old".into(), MessageKind::Text, None);
        seen.seen = true;
        store.insert(seen).await.unwrap();
        store
            .insert(Message::direct(a, b, "new".into(), MessageKind::Text, None))
            .await
            .unwrap();

        assert_eq!(store.mark_delivered(a, b).await.unwrap(), 1);
        let history = store.direct_between(a, b).await.unwrap();
        assert!(!history[0].delivered);
        assert!(history[1].delivered);
    }

    #[tokio::test]
    async fn group_page_is_newest_first_and_paged() {
        let store = MemoryMessages::default();
        let group_id = Uuid::new_v4();
        let sender = Uuid::new_v4();
        for i in 0..5 {
            let mut m = Message::group(sender, group_id, format!("m{i}"), MessageKind::Text, None);
            m.created_at = chrono::Utc::now() + chrono::Duration::seconds(i);
            store.insert(m).await.unwrap();
        }

        let first = store.group_page(group_id, 1, 2).await.unwrap();
        assert_eq!(
            first.iter().map(|m| m.body.as_str()).collect::<Vec<_>>(),
            vec!["m4", "m3"]
        );
        let third = store.group_page(group_id, 3, 2).await.unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].body, "m0");
    }

    #[tokio::test]
    async fn otp_replace_invalidates_prior_codes() {
        let store = MemoryOtps::default();
        store
            .replace_for_email(OtpRecord::new("a@b.c".into(), "111111".into(), 5))
            .await
            .unwrap();
        store
            .replace_for_email(OtpRecord::new("a@b.c".into(), "222222".into(), 5))
            .await
            .unwrap();

        assert!(store.find("a@b.c", "111111").await.unwrap().is_none());
        assert!(store.find("a@b.c", "222222").await.unwrap().is_some());
    }
}
