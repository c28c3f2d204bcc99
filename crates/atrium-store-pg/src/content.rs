// SPDX-License-Identifier: Apache-2.0
//! Venue, area, and media trait implementations over Postgres.

use async_trait::async_trait;

use atrium_core::media::MediaAsset;
use atrium_core::venue::{Area, Venue};
use atrium_core::{AreaId, AssetId, OrgId, VenueId};
use atrium_store::{AreaStore, MediaStore, StoreError, StoreResult, VenueStore};
use uuid::Uuid;

use crate::rows::{AreaRow, MediaAssetRow, VenueRow};
use crate::{map_sqlx, PgBackend};

const VENUE_COLS: &str =
    "id, organization_id, name, slug, description, live_revision_id, draft_revision_id, created_at";
const ASSET_COLS: &str = "id, organization_id, bucket, key, file_name, mime_type, kind, \
                          size_bytes, width, height, public_url, thumbnail_url, created_at";

#[async_trait]
impl VenueStore for PgBackend {
    async fn insert(&self, venue: &Venue) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO venues \
             (id, organization_id, name, slug, description, live_revision_id, draft_revision_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(venue.id.as_uuid())
        .bind(venue.org.as_uuid())
        .bind(&venue.name)
        .bind(&venue.slug)
        .bind(&venue.description)
        .bind(venue.live_revision.map(|id| id.as_uuid()))
        .bind(venue.draft_revision.map(|id| id.as_uuid()))
        .bind(venue.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn by_id(&self, id: VenueId) -> StoreResult<Option<Venue>> {
        let row = sqlx::query_as::<_, VenueRow>(&format!(
            "SELECT {VENUE_COLS} FROM venues WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn by_slug(&self, slug: &str) -> StoreResult<Option<Venue>> {
        let row = sqlx::query_as::<_, VenueRow>(&format!(
            "SELECT {VENUE_COLS} FROM venues WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, org: OrgId, limit: i64, offset: i64) -> StoreResult<Vec<Venue>> {
        let rows = sqlx::query_as::<_, VenueRow>(&format!(
            "SELECT {VENUE_COLS} FROM venues WHERE organization_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(org.as_uuid())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl AreaStore for PgBackend {
    async fn insert(&self, area: &Area) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO areas (id, venue_id, name, category, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(area.id.as_uuid())
        .bind(area.venue.as_uuid())
        .bind(&area.name)
        .bind(&area.category)
        .bind(area.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn by_id(&self, id: AreaId) -> StoreResult<Option<Area>> {
        let row = sqlx::query_as::<_, AreaRow>(
            "SELECT id, venue_id, name, category, created_at FROM areas WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, venue: VenueId) -> StoreResult<Vec<Area>> {
        let rows = sqlx::query_as::<_, AreaRow>(
            "SELECT id, venue_id, name, category, created_at \
             FROM areas WHERE venue_id = $1 ORDER BY name",
        )
        .bind(venue.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn by_ids(&self, ids: &[AreaId]) -> StoreResult<Vec<Area>> {
        let raw: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, AreaRow>(
            "SELECT id, venue_id, name, category, created_at FROM areas WHERE id = ANY($1)",
        )
        .bind(&raw)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl MediaStore for PgBackend {
    async fn insert(&self, asset: &MediaAsset) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO media_assets \
             (id, organization_id, bucket, key, file_name, mime_type, kind, size_bytes, \
              width, height, public_url, thumbnail_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(asset.id.as_uuid())
        .bind(asset.org.as_uuid())
        .bind(&asset.bucket)
        .bind(&asset.key)
        .bind(&asset.file_name)
        .bind(&asset.mime_type)
        .bind(asset.kind.as_str())
        .bind(asset.size_bytes)
        .bind(asset.width)
        .bind(asset.height)
        .bind(&asset.public_url)
        .bind(asset.thumbnail_url.as_deref())
        .bind(asset.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn by_id(&self, id: AssetId) -> StoreResult<Option<MediaAsset>> {
        let row = sqlx::query_as::<_, MediaAssetRow>(&format!(
            "SELECT {ASSET_COLS} FROM media_assets WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn set_dimensions(&self, id: AssetId, width: i32, height: i32) -> StoreResult<()> {
        let updated = sqlx::query("UPDATE media_assets SET width = $2, height = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(width)
            .bind(height)
            .execute(self.pool())
            .await
            .map_err(map_sqlx)?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound("asset"));
        }
        Ok(())
    }

    async fn by_ids(&self, ids: &[AssetId]) -> StoreResult<Vec<MediaAsset>> {
        let raw: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, MediaAssetRow>(&format!(
            "SELECT {ASSET_COLS} FROM media_assets WHERE id = ANY($1)"
        ))
        .bind(&raw)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}
