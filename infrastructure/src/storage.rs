use crate::config::Config;
use domain::attachment::ObjectStore;
use domain::error::ChatError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use shared::types::Result;
use std::sync::Arc;

/// REST client for an object storage bucket with public read URLs.
#[derive(Clone)]
pub struct BucketClient {
    client: Arc<Client>,
    base_url: String,
    bucket: String,
    api_key: String,
}

impl BucketClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Arc::new(Client::new()),
            base_url: config.storage_url.trim_end_matches('/').to_string(),
            bucket: config.storage_bucket.clone(),
            api_key: config.storage_key.clone(),
        }
    }
}

impl ObjectStore for BucketClient {
    fn put_object(
        &self,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send {
        async move {
            if self.base_url.is_empty() {
                return Err(ChatError::UploadFailed {
                    reason: "STORAGE_URL is not configured".to_string(),
                }
                .into());
            }
            if self.api_key.is_empty() {
                return Err(ChatError::UploadFailed {
                    reason: "STORAGE_KEY is not configured".to_string(),
                }
                .into());
            }
            let url = format!("{}/object/{}/{}", self.base_url, self.bucket, name);
            let response = self
                .client
                .put(&url)
                .bearer_auth(&self.api_key)
                .header(CONTENT_TYPE, mime_type)
                .body(bytes)
                .send()
                .await
                .map_err(|err| ChatError::UploadFailed {
                    reason: err.to_string(),
                })?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ChatError::UploadFailed {
                    reason: format!("HTTP {status}: {body}"),
                }
                .into());
            }
            tracing::debug!(object = %name, "attachment uploaded");
            Ok(self.public_url(name))
        }
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, name)
    }
}
