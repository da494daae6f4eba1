#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chat_service::error::{AppError, AppResult};
use chat_service::models::User;
use chat_service::services::email::EmailSender;
use chat_service::services::media::BlobStore;
use chat_service::services::notify::NotificationDispatcher;
use chat_service::services::push::PushSender;
use chat_service::store::{Store, UserStore};
use chat_service::websocket::ConnectionRegistry;

#[derive(Debug, Clone)]
pub struct SentPush {
    pub token: String,
    pub title: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingPush {
    pub sent: Mutex<Vec<SentPush>>,
}

#[async_trait]
impl PushSender for RecordingPush {
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        _data: serde_json::Value,
    ) -> AppResult<()> {
        self.sent.lock().unwrap().push(SentPush {
            token: token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Shared across instances so URLs stay unique even when a test swaps in a
/// second mock (e.g. a failing-deletes one) mid-flow.
static BLOB_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub struct RecordingBlobs {
    counter: &'static AtomicUsize,
    pub uploads: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_uploads: bool,
    pub fail_deletes: bool,
}

impl RecordingBlobs {
    pub fn new() -> Self {
        Self {
            counter: &BLOB_COUNTER,
            uploads: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            fail_uploads: false,
            fail_deletes: false,
        }
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::new()
        }
    }

    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl BlobStore for RecordingBlobs {
    async fn upload(&self, _bytes: Vec<u8>, folder: &str) -> AppResult<String> {
        if self.fail_uploads {
            return Err(AppError::ExternalService("upload refused".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let url = format!("https://cdn.test/{folder}/img{n}.jpg");
        self.uploads.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn delete(&self, public_id: &str) -> AppResult<()> {
        if self.fail_deletes {
            return Err(AppError::ExternalService("delete refused".into()));
        }
        self.deleted.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html.to_string()));
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl EmailSender for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _html: &str) -> AppResult<()> {
        Err(AppError::ExternalService("smtp unreachable".into()))
    }
}

pub struct TestApp {
    pub store: Store,
    pub registry: ConnectionRegistry,
    pub dispatcher: NotificationDispatcher,
    pub push: Arc<RecordingPush>,
}

pub fn test_app() -> TestApp {
    let push = Arc::new(RecordingPush::default());
    TestApp {
        store: Store::in_memory(),
        registry: ConnectionRegistry::new(),
        dispatcher: NotificationDispatcher::spawn(push.clone()),
        push,
    }
}

pub async fn seed_user(store: &Store, name: &str) -> User {
    let mut user = User::new(format!("{name}@test.local"));
    user.name = name.to_string();
    store.users.insert(user).await.unwrap()
}

/// Polls until the condition holds; push dispatch runs on a detached worker.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within timeout");
}
