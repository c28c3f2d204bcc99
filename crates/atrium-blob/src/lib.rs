// SPDX-License-Identifier: Apache-2.0
//! Object-storage capability.
//!
//! The backend never proxies image bytes: clients upload directly to the
//! store through short-lived presigned PUT URLs. [`BlobStore`] is the
//! capability seam; [`S3BlobStore`] talks to any S3-compatible endpoint
//! (MinIO in every current deployment), and [`FakeBlobStore`] serves tests
//! and database-free runs.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;

/// Failures talking to the object store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobError {
    /// Could not mint a presigned URL.
    #[error("presign failed: {0}")]
    Presign(String),
    /// Could not delete an object.
    #[error("delete failed: {0}")]
    Delete(String),
}

/// Storage-provider capability used by the media service.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Mints a presigned PUT URL for a direct client upload.
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, BlobError>;

    /// Deletes an object. Best-effort at call sites; failures are logged,
    /// never propagated into request outcomes.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), BlobError>;
}

/// S3-compatible implementation (MinIO, AWS S3).
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
}

impl S3BlobStore {
    /// Builds a client for an S3-compatible endpoint with static
    /// credentials. Path-style addressing is forced because MinIO does
    /// not serve virtual-host buckets out of the box.
    #[must_use]
    pub fn connect(endpoint: &str, access_key: &str, secret_key: &str, region: &str) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "atrium-static");
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();
        Self {
            client: Client::from_conf(config),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, BlobError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|err| BlobError::Presign(err.to_string()))?;
        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|err| BlobError::Presign(err.to_string()))?;
        Ok(request.uri().to_string())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), BlobError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| BlobError::Delete(err.to_string()))?;
        Ok(())
    }
}

/// Deterministic in-process stand-in for tests and `--memory` runs.
#[derive(Debug, Clone, Default)]
pub struct FakeBlobStore;

impl FakeBlobStore {
    /// Creates the fake store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> Result<String, BlobError> {
        Ok(format!(
            "https://blob.invalid/{bucket}/{key}?X-Amz-Expires={}",
            expires_in.as_secs()
        ))
    }

    async fn delete(&self, _bucket: &str, _key: &str) -> Result<(), BlobError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_presign_embeds_bucket_key_and_expiry() {
        let store = FakeBlobStore::new();
        let url = store
            .presign_put("panoramas", "org/panorama/a.jpg", "image/jpeg", Duration::from_secs(900))
            .await
            .unwrap();
        assert!(url.contains("/panoramas/org/panorama/a.jpg"));
        assert!(url.contains("X-Amz-Expires=900"));
    }
}
