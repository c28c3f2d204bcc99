// SPDX-License-Identifier: Apache-2.0
//! Media upload protocol.
//!
//! Two-step direct upload: `init` mints the asset id and a presigned PUT
//! URL (the server never sees the bytes), `confirm` finalizes the pixel
//! dimensions the client measured. Asset rows exist from `init` on so
//! that graph nodes can reference them immediately.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use atrium_blob::BlobStore;
use atrium_core::media::{MediaAsset, MediaKind};
use atrium_core::{AssetId, Error, Result};
use atrium_store::{MediaStore, Stores};

use crate::audit::AuditRecorder;
use crate::{store_err, Actor};

/// Presigned URL lifetime.
const UPLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);
/// Upper bound on declared upload size.
const MAX_UPLOAD_BYTES: i64 = 256 * 1024 * 1024;

/// Inputs for upload initialization.
#[derive(Debug, Clone)]
pub struct UploadInit {
    /// Client-side file name; its extension lands in the storage key.
    pub file_name: String,
    /// Declared MIME type, also bound into the presigned request.
    pub file_type: String,
    /// Upload category.
    pub category: MediaKind,
    /// Declared size in bytes.
    pub file_size: i64,
}

/// Result of upload initialization.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    /// Where the client PUTs the bytes (valid for 15 minutes).
    pub upload_url: String,
    /// The minted asset id to reference and later confirm.
    pub asset_id: AssetId,
    /// Storage key, for diagnostics.
    pub key: String,
}

/// Storage configuration the media service needs.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Target bucket.
    pub bucket: String,
    /// Public base URL assets are served from.
    pub cdn_base_url: String,
}

/// Upload-init / confirm.
#[derive(Clone)]
pub struct MediaService {
    stores: Stores,
    blob: Arc<dyn BlobStore>,
    config: MediaConfig,
    audit: AuditRecorder,
}

impl MediaService {
    /// Builds the service over a storage bundle and blob capability.
    #[must_use]
    pub fn new(
        stores: Stores,
        blob: Arc<dyn BlobStore>,
        config: MediaConfig,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            stores,
            blob,
            config,
            audit,
        }
    }

    /// Mints an asset id, presigns the PUT URL, and persists the pending
    /// asset row.
    pub async fn init_upload(&self, actor: Actor, params: UploadInit) -> Result<UploadTarget> {
        if params.file_size <= 0 || params.file_size > MAX_UPLOAD_BYTES {
            return Err(Error::InvalidInput("fileSize is out of range".into()));
        }
        if params.file_type.trim().is_empty() {
            return Err(Error::InvalidInput("fileType is required".into()));
        }

        let asset_id = AssetId::generate();
        let ext = std::path::Path::new(&params.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map_or_else(|| ".jpg".to_owned(), |e| format!(".{e}"));
        let key = format!("{}/{}/{asset_id}{ext}", actor.org, params.category);

        let upload_url = self
            .blob
            .presign_put(&self.config.bucket, &key, &params.file_type, UPLOAD_URL_TTL)
            .await
            .map_err(|err| Error::Unavailable(err.to_string()))?;

        let asset = MediaAsset {
            id: asset_id,
            org: actor.org,
            bucket: self.config.bucket.clone(),
            key: key.clone(),
            file_name: params.file_name,
            mime_type: params.file_type,
            kind: params.category,
            size_bytes: params.file_size,
            width: 0,
            height: 0,
            public_url: format!("{}/{key}", self.config.cdn_base_url.trim_end_matches('/')),
            thumbnail_url: None,
            created_at: Utc::now(),
        };
        self.stores.media.insert(&asset).await.map_err(store_err)?;

        self.audit.record(
            actor.org,
            Some(actor.user),
            "media.upload_init",
            "asset",
            &asset_id.to_string(),
            serde_json::json!({ "key": key, "kind": params.category }),
        );

        Ok(UploadTarget {
            upload_url,
            asset_id,
            key,
        })
    }

    /// Finalizes client-measured pixel dimensions after the direct upload.
    pub async fn confirm_upload(
        &self,
        actor: Actor,
        asset: AssetId,
        width: i32,
        height: i32,
    ) -> Result<()> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidInput("dimensions must be positive".into()));
        }
        let row = self
            .stores
            .media
            .by_id(asset)
            .await
            .map_err(store_err)?
            .filter(|a| a.org == actor.org)
            .ok_or(Error::NotFound("asset"))?;
        self.stores
            .media
            .set_dimensions(row.id, width, height)
            .await
            .map_err(store_err)
    }
}

#[cfg(test)]
mod tests {
    use atrium_blob::FakeBlobStore;
    use atrium_core::{OrgId, UserId};
    use atrium_store_mem::MemBackend;

    use crate::audit::AuditTrail;

    use super::*;

    fn service() -> (MediaService, Actor, Stores) {
        let stores = MemBackend::new().stores();
        let (recorder, _worker) = AuditTrail::spawn(stores.audit.clone(), 8);
        let service = MediaService::new(
            stores.clone(),
            Arc::new(FakeBlobStore::new()),
            MediaConfig {
                bucket: "panoramas".into(),
                cdn_base_url: "https://cdn.example.com/".into(),
            },
            recorder,
        );
        let actor = Actor {
            user: UserId::generate(),
            org: OrgId::generate(),
        };
        (service, actor, stores)
    }

    #[tokio::test]
    async fn init_then_confirm_finalizes_dimensions() {
        let (service, actor, stores) = service();
        let target = service
            .init_upload(
                actor,
                UploadInit {
                    file_name: "lobby.jpg".into(),
                    file_type: "image/jpeg".into(),
                    category: MediaKind::Panorama,
                    file_size: 1024,
                },
            )
            .await
            .unwrap();

        assert!(target.key.starts_with(&format!("{}/panorama/", actor.org)));
        assert!(target.key.ends_with(".jpg"));
        assert!(target.upload_url.contains(&target.key));

        let pending = stores.media.by_id(target.asset_id).await.unwrap().unwrap();
        assert_eq!(pending.width, 0);
        assert_eq!(
            pending.public_url,
            format!("https://cdn.example.com/{}", target.key)
        );

        service
            .confirm_upload(actor, target.asset_id, 8192, 4096)
            .await
            .unwrap();
        let confirmed = stores.media.by_id(target.asset_id).await.unwrap().unwrap();
        assert_eq!((confirmed.width, confirmed.height), (8192, 4096));
    }

    #[tokio::test]
    async fn confirm_is_tenant_scoped() {
        let (service, actor, _stores) = service();
        let target = service
            .init_upload(
                actor,
                UploadInit {
                    file_name: "x.png".into(),
                    file_type: "image/png".into(),
                    category: MediaKind::Floorplan,
                    file_size: 10,
                },
            )
            .await
            .unwrap();
        let stranger = Actor {
            user: UserId::generate(),
            org: OrgId::generate(),
        };
        let err = service
            .confirm_upload(stranger, target.asset_id, 1, 1)
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotFound("asset"));
    }

    #[tokio::test]
    async fn extensionless_names_default_to_jpg() {
        let (service, actor, _stores) = service();
        let target = service
            .init_upload(
                actor,
                UploadInit {
                    file_name: "pano".into(),
                    file_type: "image/jpeg".into(),
                    category: MediaKind::Panorama,
                    file_size: 10,
                },
            )
            .await
            .unwrap();
        assert!(target.key.ends_with(".jpg"));
    }
}
