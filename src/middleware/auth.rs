use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::store::UserStore;

/// The authenticated caller, attached to request extensions by the guard.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// Bearer-token guard. Resolves the credential subject to a current user
/// record; every failure mode (missing, malformed, expired, unknown subject)
/// maps to an access-denied response.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();
    // The websocket route authenticates during its own handshake
    if matches!(path, "/" | "/health" | "/ws")
        || path.starts_with("/api/auth/")
    {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Auth("no token".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("malformed authorization header".into()))?;

    let user_id = state.tokens.verify(token)?;
    let user = state
        .store
        .users
        .get(user_id)
        .await?
        .ok_or_else(|| AppError::Auth("user not found".into()))?;

    req.extensions_mut().insert(AuthUser(user.id));
    Ok(next.run(req).await)
}
