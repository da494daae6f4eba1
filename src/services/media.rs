use async_trait::async_trait;

use crate::config::BlobConfig;
use crate::error::{AppError, AppResult};

pub const PROFILE_FOLDER: &str = "chat-app-profiles";
pub const GROUP_FOLDER: &str = "chat-app-groups";

/// Opaque blob store. Uploads return the public URL under which the asset is
/// served; deletion is addressed by the public id derived from that URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, folder: &str) -> AppResult<String>;
    async fn delete(&self, public_id: &str) -> AppResult<()>;
}

/// Last path segment with the extension stripped, prefixed by the folder.
pub fn public_id_from_url(url: &str, folder: &str) -> Option<String> {
    let file = url.rsplit('/').next()?;
    let stem = file.split('.').next()?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{folder}/{stem}"))
}

/// HTTP-backed blob store client.
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpBlobStore {
    pub fn new(cfg: &BlobConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, bytes: Vec<u8>, folder: &str) -> AppResult<String> {
        let form = reqwest::multipart::Form::new()
            .text("folder", folder.to_string())
            .part("file", reqwest::multipart::Part::bytes(bytes));
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("blob upload: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::ExternalService(format!("blob upload: {e}")))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("blob upload response: {e}")))?;
        body.get("url")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::ExternalService("blob upload response missing url".into()))
    }

    async fn delete(&self, public_id: &str) -> AppResult<()> {
        self.client
            .delete(format!("{}/{}", self.base_url, public_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("blob delete: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::ExternalService(format!("blob delete: {e}")))?;
        Ok(())
    }
}

/// Stand-in used when no blob store is configured: uploads are refused so a
/// record never ends up referencing an asset that was not stored.
pub struct DisabledBlobStore;

#[async_trait]
impl BlobStore for DisabledBlobStore {
    async fn upload(&self, _bytes: Vec<u8>, _folder: &str) -> AppResult<String> {
        Err(AppError::ExternalService("blob store not configured".into()))
    }

    async fn delete(&self, _public_id: &str) -> AppResult<()> {
        Err(AppError::ExternalService("blob store not configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_id_strips_extension_and_prefixes_folder() {
        assert_eq!(
            public_id_from_url("https://cdn.example.com/x/abc123.jpg", GROUP_FOLDER).as_deref(),
            Some("chat-app-groups/abc123")
        );
        assert_eq!(public_id_from_url("https://cdn.example.com/x/", GROUP_FOLDER), None);
    }
}
