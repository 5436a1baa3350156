//! Hosted object storage for uploaded images.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::BaseImageStore;

/// Uploads to a storage bucket over the hosted backend's REST API.
///
/// Objects are written with `x-upsert: false`, so an existing path is an error.
pub struct HostedImageStore {
    http: Client,
    base_url: Url,
    service_key: String,
    bucket: String,
}

impl HostedImageStore {
    pub fn new(
        base_url: &str,
        service_key: impl Into<String>,
        bucket: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid storage URL")?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build storage HTTP client")?;

        Ok(Self {
            http,
            base_url,
            service_key: service_key.into(),
            bucket: bucket.into(),
        })
    }

    fn object_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(&format!("storage/v1/object/{}/{}", self.bucket, path))
            .context("Failed to build object URL")
    }

    /// Public URL a stored object is served from
    pub fn public_url(&self, path: &str) -> Result<String> {
        let url = self
            .base_url
            .join(&format!("storage/v1/object/public/{}/{}", self.bucket, path))
            .context("Failed to build public URL")?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl BaseImageStore for HostedImageStore {
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let size = bytes.len();
        let response = self
            .http
            .post(self.object_url(path)?)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("content-type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .context("Storage upload request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Storage upload failed ({}): {}", status, body);
        }

        tracing::info!(path = %path, size, "Uploaded image");
        self.public_url(path)
    }
}
