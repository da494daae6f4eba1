use axum::{extract::Multipart, middleware::from_fn_with_state, routing::get, Router};
use std::collections::HashMap;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{AppError, AppResult};
use crate::middleware::auth_middleware;
use crate::state::AppState;
use crate::websocket::handlers::ws_handler;

pub mod auth;
pub mod chat;
pub mod groups;
pub mod users;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Welcome to the api" }))
        .route("/health", get(|| async { "ok" }))
        .nest("/api/auth", auth::router())
        .nest("/api/users", users::router())
        .nest("/api/chat", chat::router())
        .nest("/api/groups", groups::router())
        .route("/ws", get(ws_handler))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A parsed multipart form: text fields by name plus the one optional file
/// part the endpoint accepts.
pub(crate) struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<Vec<u8>>,
}

pub(crate) async fn read_upload(
    mut multipart: Multipart,
    file_field: &str,
) -> AppResult<UploadForm> {
    let mut fields = HashMap::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = match field.name() {
            Some(n) => n.to_string(),
            None => continue,
        };
        if name == file_field {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("unreadable file part: {e}")))?;
            if !bytes.is_empty() {
                file = Some(bytes.to_vec());
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("unreadable field {name}: {e}")))?;
            fields.insert(name, value);
        }
    }

    Ok(UploadForm { fields, file })
}
