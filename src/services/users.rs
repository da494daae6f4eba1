use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{User, UserSummary};
use crate::store::{Store, UserStore};

use super::media::{public_id_from_url, BlobStore, PROFILE_FOLDER};

pub struct UserService;

impl UserService {
    pub async fn get_profile(store: &Store, user_id: Uuid) -> AppResult<User> {
        store.users.require(user_id).await
    }

    /// First-login profile setup. An uploaded avatar that fails to store
    /// fails the whole call; the profile must not reference a missing asset.
    pub async fn complete_profile(
        store: &Store,
        blobs: &dyn BlobStore,
        user_id: Uuid,
        name: String,
        phone: String,
        image: Option<Vec<u8>>,
    ) -> AppResult<User> {
        if name.trim().is_empty() || phone.trim().is_empty() {
            return Err(AppError::Validation("name and phone required".into()));
        }

        let mut user = store.users.require(user_id).await?;
        if let Some(bytes) = image {
            user.profile_pic = Some(blobs.upload(bytes, PROFILE_FOLDER).await?);
        }
        user.name = name.trim().to_string();
        user.phone = Some(phone.trim().to_string());
        store.users.save(&user).await?;
        Ok(user)
    }

    pub async fn update_profile(
        store: &Store,
        blobs: &dyn BlobStore,
        user_id: Uuid,
        name: Option<String>,
        phone: Option<String>,
        about: Option<String>,
        image: Option<Vec<u8>>,
    ) -> AppResult<User> {
        let mut user = store.users.require(user_id).await?;

        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            user.name = name.trim().to_string();
        }
        if let Some(phone) = phone.filter(|p| !p.trim().is_empty()) {
            user.phone = Some(phone.trim().to_string());
        }
        if let Some(about) = about.filter(|a| !a.trim().is_empty()) {
            user.about = about.trim().to_string();
        }

        if let Some(bytes) = image {
            // Old avatar cleanup is best-effort; a new upload failing is not
            if let Some(old_url) = user.profile_pic.as_deref() {
                if let Some(public_id) = public_id_from_url(old_url, PROFILE_FOLDER) {
                    if let Err(e) = blobs.delete(&public_id).await {
                        tracing::warn!(error = %e, %public_id, "failed to delete previous avatar");
                    }
                }
            }
            user.profile_pic = Some(blobs.upload(bytes, PROFILE_FOLDER).await?);
        }

        store.users.save(&user).await?;
        Ok(user)
    }

    /// Everyone except the caller, display fields only.
    pub async fn list_users(store: &Store, caller_id: Uuid) -> AppResult<Vec<UserSummary>> {
        Ok(store
            .users
            .list_except(caller_id)
            .await?
            .iter()
            .map(User::summary)
            .collect())
    }

    pub async fn save_push_token(store: &Store, user_id: Uuid, token: String) -> AppResult<()> {
        if token.trim().is_empty() {
            return Err(AppError::Validation("push token required".into()));
        }
        let mut user = store.users.require(user_id).await?;
        user.push_token = Some(token.trim().to_string());
        store.users.save(&user).await
    }

    pub async fn mark_online(store: &Store, user_id: Uuid) -> AppResult<()> {
        let mut user = store.users.require(user_id).await?;
        user.is_online = true;
        store.users.save(&user).await
    }

    /// Offline transition on disconnect; the caller has already checked the
    /// disconnecting connection is still the one on record.
    pub async fn mark_offline(store: &Store, user_id: Uuid) -> AppResult<()> {
        let mut user = store.users.require(user_id).await?;
        user.is_online = false;
        user.last_seen = Some(Utc::now());
        store.users.save(&user).await
    }
}
