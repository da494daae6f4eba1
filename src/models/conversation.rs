use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::message::MessageKind;

/// Canonical key for an unordered participant pair. Lookups must match
/// regardless of which side initiated, so the pair is always stored sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey(pub Uuid, pub Uuid);

impl PairKey {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            PairKey(a, b)
        } else {
            PairKey(b, a)
        }
    }
}

/// Summary record for a direct chat between exactly two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub participants: [Uuid; 2],
    pub last_message: Option<String>,
    pub last_message_kind: MessageKind,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread: HashMap<Uuid, u32>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        let PairKey(lo, hi) = PairKey::new(a, b);
        Self {
            id: Uuid::new_v4(),
            participants: [lo, hi],
            last_message: None,
            last_message_kind: MessageKind::Text,
            last_message_at: None,
            unread: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(self.participants[0], self.participants[1])
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    pub fn other_participant(&self, user_id: Uuid) -> Option<Uuid> {
        self.participants.iter().copied().find(|&p| p != user_id)
    }

    pub fn unread_for(&self, user_id: Uuid) -> u32 {
        self.unread.get(&user_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_order_insensitive() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
    }

    #[test]
    fn new_conversation_stores_sorted_pair() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let conv = Conversation::new(a, b);
        let swapped = Conversation::new(b, a);
        assert_eq!(conv.participants, swapped.participants);
        assert!(conv.involves(a) && conv.involves(b));
        assert_eq!(conv.other_participant(a), Some(b));
    }
}
