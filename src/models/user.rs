use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_ABOUT: &str = "Hey there! I'm using ChatApp";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub about: String,
    pub profile_pic: Option<String>,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A fresh account as created on first OTP verification. Profile fields
    /// are filled in later via `complete_profile`.
    pub fn new(email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            email: Some(email),
            phone: None,
            about: DEFAULT_ABOUT.to_string(),
            profile_pic: None,
            is_online: false,
            last_seen: None,
            push_token: None,
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            profile_pic: self.profile_pic.clone(),
            is_online: self.is_online,
        }
    }
}

/// Display fields exposed when a user is referenced from a message,
/// conversation or group listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub profile_pic: Option<String>,
    pub is_online: bool,
}
