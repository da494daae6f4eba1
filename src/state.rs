use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        auth::TokenIssuer, email::EmailSender, media::BlobStore, notify::NotificationDispatcher,
    },
    store::Store,
    websocket::ConnectionRegistry,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub registry: ConnectionRegistry,
    pub config: Arc<Config>,
    pub tokens: Arc<TokenIssuer>,
    pub blobs: Arc<dyn BlobStore>,
    pub mailer: Arc<dyn EmailSender>,
    pub push: NotificationDispatcher,
}
