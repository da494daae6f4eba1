use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Group, MessageKind};
use crate::services::{
    groups::{GroupDetails, GroupService},
    messages::{GroupHistory, GroupMessageView, MessageService},
};
use crate::state::AppState;

use super::read_upload;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group))
        .route("/mine", get(my_groups))
        .route("/send", post(send_group_message))
        .route("/:group_id", get(group_details).put(update_group))
        .route("/:group_id/messages", get(group_messages))
        .route("/:group_id/add-member", put(add_member))
        .route("/:group_id/remove-member", put(remove_member))
        .route("/:group_id/leave", put(leave_group))
        .route("/:group_id/make-admin", put(make_admin))
}

async fn create_group(
    State(state): State<AppState>,
    Extension(AuthUser(creator_id)): Extension<AuthUser>,
    multipart: Multipart,
) -> AppResult<Json<Group>> {
    let mut form = read_upload(multipart, "group_pic").await?;
    let name = form
        .fields
        .remove("name")
        .ok_or_else(|| AppError::Validation("group name and members required".into()))?;
    let members: Vec<Uuid> = match form.fields.remove("members") {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|_| AppError::Validation("members must be a JSON array of ids".into()))?,
        None => Vec::new(),
    };

    let group = GroupService::create_group(
        &state.store,
        state.blobs.as_ref(),
        creator_id,
        name,
        members,
        form.file,
    )
    .await?;
    Ok(Json(group))
}

async fn my_groups(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> AppResult<Json<Vec<Group>>> {
    Ok(Json(GroupService::user_groups(&state.store, user_id).await?))
}

async fn group_details(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> AppResult<Json<GroupDetails>> {
    Ok(Json(GroupService::group_details(&state.store, group_id).await?))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

async fn group_messages(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<GroupHistory>> {
    let history =
        MessageService::group_history(&state.store, group_id, user_id, query.page.unwrap_or(1))
            .await?;
    Ok(Json(history))
}

#[derive(Debug, Deserialize)]
struct SendGroupMessageRequest {
    group_id: Uuid,
    #[serde(default)]
    body: String,
    #[serde(default)]
    kind: MessageKind,
    #[serde(default)]
    media_url: Option<String>,
}

async fn send_group_message(
    State(state): State<AppState>,
    Extension(AuthUser(sender_id)): Extension<AuthUser>,
    Json(req): Json<SendGroupMessageRequest>,
) -> AppResult<Json<GroupMessageView>> {
    let view = MessageService::send_group(
        &state.store,
        &state.registry,
        sender_id,
        req.group_id,
        req.body,
        req.kind,
        req.media_url,
    )
    .await?;
    Ok(Json(view))
}

async fn update_group(
    State(state): State<AppState>,
    Extension(AuthUser(caller_id)): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<Group>> {
    let mut form = read_upload(multipart, "group_pic").await?;
    let group = GroupService::update_group(
        &state.store,
        state.blobs.as_ref(),
        group_id,
        caller_id,
        form.fields.remove("name"),
        form.file,
    )
    .await?;
    Ok(Json(group))
}

#[derive(Debug, Deserialize)]
struct MemberRequest {
    user_id: Uuid,
}

async fn add_member(
    State(state): State<AppState>,
    Extension(AuthUser(caller_id)): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<MemberRequest>,
) -> AppResult<Json<Group>> {
    Ok(Json(
        GroupService::add_member(&state.store, group_id, caller_id, req.user_id).await?,
    ))
}

async fn remove_member(
    State(state): State<AppState>,
    Extension(AuthUser(caller_id)): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<MemberRequest>,
) -> AppResult<Json<Group>> {
    Ok(Json(
        GroupService::remove_member(&state.store, group_id, caller_id, req.user_id).await?,
    ))
}

async fn leave_group(
    State(state): State<AppState>,
    Extension(AuthUser(caller_id)): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
) -> AppResult<Json<Group>> {
    Ok(Json(
        GroupService::leave_group(&state.store, group_id, caller_id).await?,
    ))
}

async fn make_admin(
    State(state): State<AppState>,
    Extension(AuthUser(caller_id)): Extension<AuthUser>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<MemberRequest>,
) -> AppResult<Json<Group>> {
    Ok(Json(
        GroupService::make_admin(&state.store, group_id, caller_id, req.user_id).await?,
    ))
}
