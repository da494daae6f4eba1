use async_trait::async_trait;
use serde_json::json;

use crate::config::PushConfig;
use crate::error::{AppError, AppResult};

/// Push gateway client. Delivery is best-effort; callers never wait on it in
/// the request path.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> AppResult<()>;
}

pub struct HttpPush {
    client: reqwest::Client,
    gateway_url: String,
}

impl HttpPush {
    pub fn new(cfg: &PushConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            gateway_url: cfg.gateway_url.clone(),
        }
    }
}

#[async_trait]
impl PushSender for HttpPush {
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> AppResult<()> {
        self.client
            .post(&self.gateway_url)
            .json(&json!({
                "to": token,
                "sound": "default",
                "title": title,
                "body": body,
                "data": data,
            }))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("push send: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::ExternalService(format!("push send: {e}")))?;
        Ok(())
    }
}

/// Used when no push gateway is configured.
pub struct NoopPush;

#[async_trait]
impl PushSender for NoopPush {
    async fn send(
        &self,
        _token: &str,
        title: &str,
        _body: &str,
        _data: serde_json::Value,
    ) -> AppResult<()> {
        tracing::debug!(%title, "push gateway not configured; dropping notification");
        Ok(())
    }
}
