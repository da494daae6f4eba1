use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::services::auth::{AuthService, VerifiedLogin};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send-otp", post(send_otp))
        .route("/verify-otp", post(verify_otp))
}

#[derive(Debug, Deserialize)]
struct SendOtpRequest {
    email: String,
}

async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> AppResult<Json<serde_json::Value>> {
    AuthService::request_otp(
        &state.store,
        state.mailer.as_ref(),
        &req.email,
        state.config.otp_ttl_minutes,
    )
    .await?;
    Ok(Json(json!({ "success": true, "message": "OTP sent" })))
}

#[derive(Debug, Deserialize)]
struct VerifyOtpRequest {
    email: String,
    otp: String,
}

async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> AppResult<Json<VerifiedLogin>> {
    let login = AuthService::verify_otp(&state.store, &state.tokens, &req.email, &req.otp).await?;
    Ok(Json(login))
}
