// SPDX-License-Identifier: Apache-2.0
//! Venue, area, and media trait implementations.

use async_trait::async_trait;

use atrium_core::media::MediaAsset;
use atrium_core::venue::{Area, Venue};
use atrium_core::{AreaId, AssetId, OrgId, VenueId};
use atrium_store::{AreaStore, Constraint, MediaStore, StoreError, StoreResult, VenueStore};

use crate::MemBackend;

#[async_trait]
impl VenueStore for MemBackend {
    async fn insert(&self, venue: &Venue) -> StoreResult<()> {
        let mut t = self.tables();
        if t.venues.values().any(|v| v.slug == venue.slug) {
            return Err(StoreError::Duplicate(Constraint::VenueSlug));
        }
        t.venues.insert(venue.id, venue.clone());
        Ok(())
    }

    async fn by_id(&self, id: VenueId) -> StoreResult<Option<Venue>> {
        Ok(self.tables().venues.get(&id).cloned())
    }

    async fn by_slug(&self, slug: &str) -> StoreResult<Option<Venue>> {
        Ok(self
            .tables()
            .venues
            .values()
            .find(|v| v.slug == slug)
            .cloned())
    }

    async fn list(&self, org: OrgId, limit: i64, offset: i64) -> StoreResult<Vec<Venue>> {
        let t = self.tables();
        let mut venues: Vec<Venue> = t.venues.values().filter(|v| v.org == org).cloned().collect();
        venues.sort_by_key(|v| std::cmp::Reverse((v.created_at, v.id)));
        Ok(venues
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }
}

#[async_trait]
impl AreaStore for MemBackend {
    async fn insert(&self, area: &Area) -> StoreResult<()> {
        self.tables().areas.insert(area.id, area.clone());
        Ok(())
    }

    async fn by_id(&self, id: AreaId) -> StoreResult<Option<Area>> {
        Ok(self.tables().areas.get(&id).cloned())
    }

    async fn list(&self, venue: VenueId) -> StoreResult<Vec<Area>> {
        let t = self.tables();
        let mut areas: Vec<Area> = t.areas.values().filter(|a| a.venue == venue).cloned().collect();
        areas.sort_by_key(|a| a.name.clone());
        Ok(areas)
    }

    async fn by_ids(&self, ids: &[AreaId]) -> StoreResult<Vec<Area>> {
        let t = self.tables();
        Ok(ids.iter().filter_map(|id| t.areas.get(id).cloned()).collect())
    }
}

#[async_trait]
impl MediaStore for MemBackend {
    async fn insert(&self, asset: &MediaAsset) -> StoreResult<()> {
        self.tables().media.insert(asset.id, asset.clone());
        Ok(())
    }

    async fn by_id(&self, id: AssetId) -> StoreResult<Option<MediaAsset>> {
        Ok(self.tables().media.get(&id).cloned())
    }

    async fn set_dimensions(&self, id: AssetId, width: i32, height: i32) -> StoreResult<()> {
        let mut t = self.tables();
        let asset = t.media.get_mut(&id).ok_or(StoreError::NotFound("asset"))?;
        asset.width = width;
        asset.height = height;
        Ok(())
    }

    async fn by_ids(&self, ids: &[AssetId]) -> StoreResult<Vec<MediaAsset>> {
        let t = self.tables();
        Ok(ids.iter().filter_map(|id| t.media.get(id).cloned()).collect())
    }
}
