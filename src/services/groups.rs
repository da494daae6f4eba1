use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Group, UserSummary};
use crate::store::{GroupStore, Store, UserStore};

use super::media::{public_id_from_url, BlobStore, GROUP_FOLDER};

#[derive(Debug, Serialize)]
pub struct GroupDetails {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub members: Vec<UserSummary>,
    pub admins: Vec<UserSummary>,
}

pub struct GroupService;

impl GroupService {
    /// Creates a group: members de-duplicated, the creator always included
    /// and sole initial admin. The image (if any) is stored first, so a
    /// failed upload fails the whole creation.
    pub async fn create_group(
        store: &Store,
        blobs: &dyn BlobStore,
        creator_id: Uuid,
        name: String,
        member_ids: Vec<Uuid>,
        image: Option<Vec<u8>>,
    ) -> AppResult<Group> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("group name required".into()));
        }

        let image_url = match image {
            Some(bytes) => Some(blobs.upload(bytes, GROUP_FOLDER).await?),
            None => None,
        };

        let group = Group::new(creator_id, name.trim().to_string(), member_ids, image_url);
        store.groups.insert(group.clone()).await?;
        Ok(group)
    }

    pub async fn add_member(
        store: &Store,
        group_id: Uuid,
        caller_id: Uuid,
        target_id: Uuid,
    ) -> AppResult<Group> {
        let mut group = store.groups.require(group_id).await?;
        if !group.is_admin(caller_id) {
            return Err(AppError::Forbidden("only an admin can add members".into()));
        }
        if group.is_member(target_id) {
            return Err(AppError::Validation("user already in group".into()));
        }

        group.members.push(target_id);
        group.updated_at = Utc::now();
        store.groups.save(&group).await?;
        Ok(group)
    }

    /// Removes the target from members and strips admin status if held. The
    /// shared removal path keeps the ≥1-admin invariant when members remain.
    pub async fn remove_member(
        store: &Store,
        group_id: Uuid,
        caller_id: Uuid,
        target_id: Uuid,
    ) -> AppResult<Group> {
        let mut group = store.groups.require(group_id).await?;
        if !group.is_admin(caller_id) {
            return Err(AppError::Forbidden(
                "only an admin can remove members".into(),
            ));
        }

        group.remove_participant(target_id);
        group.updated_at = Utc::now();
        store.groups.save(&group).await?;
        Ok(group)
    }

    /// Caller leaves the group. If that departure empties the admin set while
    /// members remain, the first remaining member is promoted.
    pub async fn leave_group(store: &Store, group_id: Uuid, caller_id: Uuid) -> AppResult<Group> {
        let mut group = store.groups.require(group_id).await?;
        group.remove_participant(caller_id);
        group.updated_at = Utc::now();
        store.groups.save(&group).await?;
        Ok(group)
    }

    pub async fn make_admin(
        store: &Store,
        group_id: Uuid,
        caller_id: Uuid,
        target_id: Uuid,
    ) -> AppResult<Group> {
        let mut group = store.groups.require(group_id).await?;
        if !group.is_admin(caller_id) {
            return Err(AppError::Forbidden(
                "only an admin can assign the admin role".into(),
            ));
        }
        if !group.is_member(target_id) {
            return Err(AppError::Validation("user is not a member".into()));
        }
        if group.is_admin(target_id) {
            return Err(AppError::Validation("user is already an admin".into()));
        }

        group.admins.push(target_id);
        group.updated_at = Utc::now();
        store.groups.save(&group).await?;
        Ok(group)
    }

    /// Renames the group and/or replaces its image. The previous image is
    /// deleted from the blob store first; that deletion failing is logged,
    /// while a failed upload of the replacement fails the operation.
    pub async fn update_group(
        store: &Store,
        blobs: &dyn BlobStore,
        group_id: Uuid,
        caller_id: Uuid,
        name: Option<String>,
        image: Option<Vec<u8>>,
    ) -> AppResult<Group> {
        let mut group = store.groups.require(group_id).await?;
        if !group.is_admin(caller_id) {
            return Err(AppError::Forbidden("only an admin can edit the group".into()));
        }

        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            group.name = name.trim().to_string();
        }

        if let Some(bytes) = image {
            if let Some(old_url) = group.image_url.as_deref() {
                if let Some(public_id) = public_id_from_url(old_url, GROUP_FOLDER) {
                    if let Err(e) = blobs.delete(&public_id).await {
                        tracing::warn!(error = %e, %public_id, "failed to delete previous group image");
                    }
                }
            }
            group.image_url = Some(blobs.upload(bytes, GROUP_FOLDER).await?);
        }

        group.updated_at = Utc::now();
        store.groups.save(&group).await?;
        Ok(group)
    }

    pub async fn user_groups(store: &Store, user_id: Uuid) -> AppResult<Vec<Group>> {
        store.groups.list_for_member(user_id).await
    }

    pub async fn group_details(store: &Store, group_id: Uuid) -> AppResult<GroupDetails> {
        let group = store.groups.require(group_id).await?;

        let mut members = Vec::with_capacity(group.members.len());
        for &id in &group.members {
            if let Some(user) = store.users.get(id).await? {
                members.push(user.summary());
            }
        }
        let mut admins = Vec::with_capacity(group.admins.len());
        for &id in &group.admins {
            if let Some(user) = store.users.get(id).await? {
                admins.push(user.summary());
            }
        }

        Ok(GroupDetails {
            id: group.id,
            name: group.name,
            image_url: group.image_url,
            members,
            admins,
        })
    }
}
