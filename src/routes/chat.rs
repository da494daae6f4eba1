use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::MessageKind;
use crate::services::{
    conversations::{ConversationService, ConversationView},
    messages::{DirectMessageView, MessageService},
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send", post(send_message))
        .route("/history/:user1/:user2", get(history))
        .route("/seen", put(mark_seen))
        .route("/conversations", get(conversations))
}

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    receiver_id: Option<Uuid>,
    group_id: Option<Uuid>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    kind: MessageKind,
    #[serde(default)]
    media_url: Option<String>,
}

/// One endpoint serves both destinations, dispatching on which id is set
/// (a group id wins, mirroring the client contract).
async fn send_message(
    State(state): State<AppState>,
    Extension(AuthUser(sender_id)): Extension<AuthUser>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Response> {
    if let Some(group_id) = req.group_id {
        let view = MessageService::send_group(
            &state.store,
            &state.registry,
            sender_id,
            group_id,
            req.body,
            req.kind,
            req.media_url,
        )
        .await?;
        return Ok(Json(view).into_response());
    }

    let message = MessageService::send_direct(
        &state.store,
        &state.registry,
        &state.push,
        sender_id,
        req.receiver_id,
        req.body,
        req.kind,
        req.media_url,
    )
    .await?;
    Ok(Json(message).into_response())
}

async fn history(
    State(state): State<AppState>,
    Path((user1, user2)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Vec<DirectMessageView>>> {
    Ok(Json(MessageService::history(&state.store, user1, user2).await?))
}

#[derive(Debug, Deserialize)]
struct MarkSeenRequest {
    sender_id: Uuid,
    receiver_id: Uuid,
}

async fn mark_seen(
    State(state): State<AppState>,
    Json(req): Json<MarkSeenRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = MessageService::mark_seen(&state.store, req.sender_id, req.receiver_id).await?;
    Ok(Json(json!({ "success": true, "updated": updated })))
}

async fn conversations(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> AppResult<Json<Vec<ConversationView>>> {
    Ok(Json(
        ConversationService::list_conversations(&state.store, user_id).await?,
    ))
}
