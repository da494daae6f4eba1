use axum::{
    extract::{Multipart, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::{User, UserSummary};
use crate::services::users::UserService;
use crate::state::AppState;

use super::read_upload;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_profile).put(update_profile))
        .route("/complete-profile", post(complete_profile))
        .route("/push-token", put(save_push_token))
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> AppResult<Json<User>> {
    Ok(Json(UserService::get_profile(&state.store, user_id).await?))
}

async fn complete_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    multipart: Multipart,
) -> AppResult<Json<User>> {
    let mut form = read_upload(multipart, "profile_pic").await?;
    let name = form.fields.remove("name").unwrap_or_default();
    let phone = form.fields.remove("phone").unwrap_or_default();

    let user = UserService::complete_profile(
        &state.store,
        state.blobs.as_ref(),
        user_id,
        name,
        phone,
        form.file,
    )
    .await?;
    Ok(Json(user))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    multipart: Multipart,
) -> AppResult<Json<User>> {
    let mut form = read_upload(multipart, "profile_pic").await?;
    let user = UserService::update_profile(
        &state.store,
        state.blobs.as_ref(),
        user_id,
        form.fields.remove("name"),
        form.fields.remove("phone"),
        form.fields.remove("about"),
        form.file,
    )
    .await?;
    Ok(Json(user))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> AppResult<Json<Vec<UserSummary>>> {
    Ok(Json(UserService::list_users(&state.store, user_id).await?))
}

#[derive(Debug, Deserialize)]
struct PushTokenRequest {
    token: String,
}

async fn save_push_token(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<PushTokenRequest>,
) -> AppResult<Json<serde_json::Value>> {
    UserService::save_push_token(&state.store, user_id, req.token).await?;
    Ok(Json(json!({ "success": true, "message": "push token saved" })))
}
