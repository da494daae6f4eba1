use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Conversation, Group, Message, OtpRecord, User};

pub mod memory;

/// Persistence seams for the document store. Engine internals are out of
/// scope; the contract each implementation must honor is that every single
/// method call is atomic.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> AppResult<User>;
    async fn get(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn save(&self, user: &User) -> AppResult<()>;
    async fn list_except(&self, id: Uuid) -> AppResult<Vec<User>>;

    async fn require(&self, id: Uuid) -> AppResult<User> {
        self.get(id).await?.ok_or(AppError::NotFound("user"))
    }
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, message: Message) -> AppResult<Message>;
    /// Direct messages between the two users, either direction, ascending by
    /// creation time.
    async fn direct_between(&self, a: Uuid, b: Uuid) -> AppResult<Vec<Message>>;
    /// One page of a group's messages, newest first. Pages are 1-based.
    async fn group_page(&self, group_id: Uuid, page: u32, limit: usize) -> AppResult<Vec<Message>>;
    /// Sets `seen` on all unseen sender->receiver messages. Returns how many
    /// were updated.
    async fn mark_seen(&self, sender_id: Uuid, receiver_id: Uuid) -> AppResult<u64>;
    /// Sets `delivered` on all unseen sender->receiver messages.
    async fn mark_delivered(&self, sender_id: Uuid, receiver_id: Uuid) -> AppResult<u64>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Finds or creates the conversation for the unordered pair in one atomic
    /// operation, keyed by the canonical sorted pair. Concurrent first
    /// messages between the same pair must converge on a single record.
    async fn upsert_for_pair(&self, a: Uuid, b: Uuid) -> AppResult<Conversation>;
    async fn find_by_pair(&self, a: Uuid, b: Uuid) -> AppResult<Option<Conversation>>;
    async fn save(&self, conversation: &Conversation) -> AppResult<()>;
    /// Conversations the user participates in, most recent activity first.
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Conversation>>;
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn insert(&self, group: Group) -> AppResult<Group>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Group>>;
    async fn save(&self, group: &Group) -> AppResult<()>;
    /// Groups the user belongs to, most recently active first.
    async fn list_for_member(&self, user_id: Uuid) -> AppResult<Vec<Group>>;

    async fn require(&self, id: Uuid) -> AppResult<Group> {
        self.get(id).await?.ok_or(AppError::NotFound("group"))
    }
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Drops any prior codes for the email and stores the new one atomically.
    async fn replace_for_email(&self, record: OtpRecord) -> AppResult<()>;
    async fn find(&self, email: &str, code: &str) -> AppResult<Option<OtpRecord>>;
    async fn delete_for_email(&self, email: &str) -> AppResult<()>;
}

/// Handle bundling the per-entity stores; cheap to clone and injected into
/// every service call.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserStore>,
    pub messages: Arc<dyn MessageStore>,
    pub conversations: Arc<dyn ConversationStore>,
    pub groups: Arc<dyn GroupStore>,
    pub otps: Arc<dyn OtpStore>,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryUsers::default()),
            messages: Arc::new(memory::MemoryMessages::default()),
            conversations: Arc::new(memory::MemoryConversations::default()),
            groups: Arc::new(memory::MemoryGroups::default()),
            otps: Arc::new(memory::MemoryOtps::default()),
        }
    }
}
