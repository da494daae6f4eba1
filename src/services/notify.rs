use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use uuid::Uuid;

use super::push::PushSender;

#[derive(Debug, Clone)]
pub struct PushJob {
    pub token: String,
    pub title: String,
    pub body: String,
    pub sender_id: Uuid,
}

/// Fire-and-forget push dispatch. Jobs are queued and worked off a spawned
/// task so their latency and failures never touch the request path; send
/// errors are logged and dropped.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: UnboundedSender<PushJob>,
}

impl NotificationDispatcher {
    pub fn spawn(sender: Arc<dyn PushSender>) -> Self {
        let (tx, mut rx) = unbounded_channel::<PushJob>();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let data = json!({ "senderId": job.sender_id });
                if let Err(e) = sender.send(&job.token, &job.title, &job.body, data).await {
                    tracing::warn!(error = %e, "push notification failed");
                }
            }
        });
        Self { tx }
    }

    pub fn enqueue(&self, job: PushJob) {
        // A closed worker only means the process is shutting down
        let _ = self.tx.send(job);
    }
}
