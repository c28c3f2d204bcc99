// SPDX-License-Identifier: Apache-2.0
//! Venue, area, and media-asset storage capabilities.

use async_trait::async_trait;

use atrium_core::media::MediaAsset;
use atrium_core::venue::{Area, Venue};
use atrium_core::{AreaId, AssetId, OrgId, VenueId};

use crate::StoreResult;

/// Venues.
#[async_trait]
pub trait VenueStore: Send + Sync {
    /// Inserts a venue. Fails `Duplicate(VenueSlug)` on slug collision.
    async fn insert(&self, venue: &Venue) -> StoreResult<()>;

    /// Looks a venue up by id.
    async fn by_id(&self, id: VenueId) -> StoreResult<Option<Venue>>;

    /// Looks a venue up by slug (public manifest resolution).
    async fn by_slug(&self, slug: &str) -> StoreResult<Option<Venue>>;

    /// Lists an organization's venues, newest first.
    async fn list(&self, org: OrgId, limit: i64, offset: i64) -> StoreResult<Vec<Venue>>;
}

/// Areas (stable semantic regions, outside the revision tree).
#[async_trait]
pub trait AreaStore: Send + Sync {
    /// Inserts an area.
    async fn insert(&self, area: &Area) -> StoreResult<()>;

    /// Looks an area up by id.
    async fn by_id(&self, id: AreaId) -> StoreResult<Option<Area>>;

    /// Lists a venue's areas by name.
    async fn list(&self, venue: VenueId) -> StoreResult<Vec<Area>>;

    /// Batch lookup; missing ids are silently absent from the result.
    async fn by_ids(&self, ids: &[AreaId]) -> StoreResult<Vec<Area>>;
}

/// Media assets.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Inserts a pending asset row minted by upload-init.
    async fn insert(&self, asset: &MediaAsset) -> StoreResult<()>;

    /// Looks an asset up by id.
    async fn by_id(&self, id: AssetId) -> StoreResult<Option<MediaAsset>>;

    /// Finalizes client-reported pixel dimensions after upload.
    async fn set_dimensions(&self, id: AssetId, width: i32, height: i32) -> StoreResult<()>;

    /// Batch lookup; missing ids are silently absent from the result.
    async fn by_ids(&self, ids: &[AssetId]) -> StoreResult<Vec<MediaAsset>>;
}
