use std::sync::Arc;

use chat_service::{
    config::Config,
    error::AppError,
    logging, routes,
    services::{
        auth::TokenIssuer,
        email::{EmailSender, LogMailer, SmtpMailer},
        media::{BlobStore, DisabledBlobStore, HttpBlobStore},
        notify::NotificationDispatcher,
        push::{HttpPush, NoopPush, PushSender},
    },
    state::AppState,
    store::Store,
    websocket::ConnectionRegistry,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    logging::init_tracing();
    let config = Arc::new(Config::from_env()?);

    let store = Store::in_memory();
    let registry = ConnectionRegistry::new();
    let tokens = Arc::new(TokenIssuer::new(&config.jwt_secret, config.token_ttl_days));

    let blobs: Arc<dyn BlobStore> = match config.blob.as_ref() {
        Some(cfg) => Arc::new(HttpBlobStore::new(cfg)),
        None => {
            tracing::warn!("no blob store configured; image uploads will be refused");
            Arc::new(DisabledBlobStore)
        }
    };

    let mailer: Arc<dyn EmailSender> = match config.smtp.as_ref() {
        Some(cfg) => Arc::new(SmtpMailer::new(cfg)?),
        None => {
            tracing::warn!("no SMTP relay configured; OTP emails will be logged");
            Arc::new(LogMailer)
        }
    };

    let push_sender: Arc<dyn PushSender> = match config.push.as_ref() {
        Some(cfg) => Arc::new(HttpPush::new(cfg)),
        None => Arc::new(NoopPush),
    };
    let push = NotificationDispatcher::spawn(push_sender);

    let state = AppState {
        store,
        registry,
        config: config.clone(),
        tokens,
        blobs,
        mailer,
        push,
    };

    let app = routes::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%bind_addr, "starting chat-service");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::StartServer(e.to_string()))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::StartServer(e.to_string()))?;

    Ok(())
}
