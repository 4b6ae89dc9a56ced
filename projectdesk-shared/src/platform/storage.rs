//! Object uploads to the platform's storage API

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;

use super::{check, PlatformClient};
use crate::blob::BlobStorage;
use crate::error::DeskResult;

/// [`BlobStorage`] over one bucket, uploading with the user's token
#[derive(Debug, Clone)]
pub struct PlatformStorage {
    client: PlatformClient,
    bucket: String,
    access_token: String,
}

impl PlatformStorage {
    pub fn new(client: PlatformClient, access_token: impl Into<String>) -> Self {
        let bucket = client.config().storage_bucket.clone();
        Self {
            client,
            bucket,
            access_token: access_token.into(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.client.config().storage_url(),
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl BlobStorage for PlatformStorage {
    async fn upload(&self, path: &str, data: Bytes, content_type: Option<&str>) -> DeskResult<()> {
        let size = data.len();
        let response = self
            .client
            .request(Method::POST, &self.object_url(path), Some(&self.access_token))
            .header(
                reqwest::header::CONTENT_TYPE,
                content_type.unwrap_or("application/octet-stream"),
            )
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;

        check(response).await?;
        tracing::debug!(bucket = %self.bucket, path = %path, size, "Uploaded object");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.client.config().storage_url(),
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}
