use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

pub mod events;
pub mod handlers;

use events::ServerEvent;

/// A broadcast room, keyed by the recipient user or by the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKey {
    User(Uuid),
    Group(Uuid),
}

/// Identifies one live connection. The generation token distinguishes a
/// reconnect from the connection it replaced, so a stale disconnect cannot
/// clobber the newer connection's online state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnHandle {
    pub user_id: Uuid,
    generation: u64,
}

struct Subscriber {
    generation: u64,
    tx: UnboundedSender<ServerEvent>,
}

#[derive(Default)]
struct Inner {
    rooms: HashMap<RoomKey, Vec<Subscriber>>,
    // user -> generation of the connection currently on record
    current: HashMap<Uuid, u64>,
    next_generation: u64,
}

/// Process-local connection registry mapping identities to live socket
/// channels. Explicitly owned and injected so tests can scope one per run.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection for the user and joins their user room.
    /// The returned receiver yields every event emitted to rooms this
    /// connection is subscribed to.
    pub async fn connect(&self, user_id: Uuid) -> (ConnHandle, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = unbounded_channel();
        let mut inner = self.inner.write().await;
        inner.next_generation += 1;
        let generation = inner.next_generation;
        inner.current.insert(user_id, generation);
        inner
            .rooms
            .entry(RoomKey::User(user_id))
            .or_default()
            .push(Subscriber { generation, tx });
        (ConnHandle { user_id, generation }, rx)
    }

    pub async fn join_group(&self, handle: ConnHandle, group_id: Uuid) {
        let mut inner = self.inner.write().await;
        let tx = inner
            .rooms
            .get(&RoomKey::User(handle.user_id))
            .and_then(|subs| subs.iter().find(|s| s.generation == handle.generation))
            .map(|s| s.tx.clone());
        if let Some(tx) = tx {
            inner
                .rooms
                .entry(RoomKey::Group(group_id))
                .or_default()
                .push(Subscriber {
                    generation: handle.generation,
                    tx,
                });
        }
    }

    /// Drops the connection's subscriptions. Returns true only when this
    /// connection was still the one on record for the user, in which case the
    /// caller owns the offline transition; a stale disconnect returns false.
    pub async fn disconnect(&self, handle: ConnHandle) -> bool {
        let mut inner = self.inner.write().await;
        for subs in inner.rooms.values_mut() {
            subs.retain(|s| s.generation != handle.generation);
        }
        inner.rooms.retain(|_, subs| !subs.is_empty());
        if inner.current.get(&handle.user_id) == Some(&handle.generation) {
            inner.current.remove(&handle.user_id);
            true
        } else {
            false
        }
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.inner.read().await.current.contains_key(&user_id)
    }

    pub async fn emit_to_user(&self, user_id: Uuid, event: ServerEvent) {
        self.emit(RoomKey::User(user_id), event).await;
    }

    pub async fn emit_to_group(&self, group_id: Uuid, event: ServerEvent) {
        self.emit(RoomKey::Group(group_id), event).await;
    }

    async fn emit(&self, room: RoomKey, event: ServerEvent) {
        let mut inner = self.inner.write().await;
        if let Some(subs) = inner.rooms.get_mut(&room) {
            subs.retain(|s| s.tx.send(event.clone()).is_ok());
        }
    }
}
