use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named chat room with an ordered, duplicate-free member list and an admin
/// subset. Groups are small, so membership checks stay linear scans over the
/// ordered list (the order is load-bearing for admin promotion).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub members: Vec<Uuid>,
    pub admins: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn new(creator_id: Uuid, name: String, member_ids: Vec<Uuid>, image_url: Option<String>) -> Self {
        let mut members = vec![creator_id];
        for id in member_ids {
            if !members.contains(&id) {
                members.push(id);
            }
        }
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            image_url,
            members,
            admins: vec![creator_id],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.admins.contains(&user_id)
    }

    /// Removes the user from members and admins. If that empties the admin
    /// set while members remain, the first remaining member is promoted so
    /// the group never ends up admin-less.
    pub fn remove_participant(&mut self, user_id: Uuid) {
        self.members.retain(|&m| m != user_id);
        self.admins.retain(|&a| a != user_id);
        if self.admins.is_empty() {
            if let Some(&first) = self.members.first() {
                self.admins.push(first);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creator_is_sole_admin_and_always_member() {
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let group = Group::new(creator, "team".into(), vec![other, other, creator], None);
        assert_eq!(group.members, vec![creator, other]);
        assert_eq!(group.admins, vec![creator]);
    }

    #[test]
    fn removing_last_admin_promotes_first_remaining_member() {
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();
        let u3 = Uuid::new_v4();
        let mut group = Group::new(u1, "team".into(), vec![u2, u3], None);

        group.remove_participant(u1);
        assert_eq!(group.members, vec![u2, u3]);
        assert_eq!(group.admins, vec![u2]);
    }

    #[test]
    fn removing_final_member_leaves_empty_admin_set() {
        let u1 = Uuid::new_v4();
        let mut group = Group::new(u1, "solo".into(), vec![], None);
        group.remove_participant(u1);
        assert!(group.members.is_empty());
        assert!(group.admins.is_empty());
    }
}
