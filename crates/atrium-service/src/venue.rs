// SPDX-License-Identifier: Apache-2.0
//! Venue and area management.

use chrono::Utc;
use uuid::Uuid;

use atrium_core::venue::{slugify, Area, Venue};
use atrium_core::{AreaId, Error, Result, VenueId};
use atrium_store::{AreaStore, Stores, VenueStore};

use crate::audit::AuditRecorder;
use crate::{clamp_limit, store_err, Actor};

/// Default venue page size.
const DEFAULT_PAGE: i64 = 10;
/// Maximum venue page size.
const MAX_PAGE: i64 = 100;

/// Venue and area management scoped to the caller's organization.
#[derive(Clone)]
pub struct VenueService {
    stores: Stores,
    audit: AuditRecorder,
}

impl VenueService {
    /// Builds the service over a storage bundle.
    #[must_use]
    pub fn new(stores: Stores, audit: AuditRecorder) -> Self {
        Self { stores, audit }
    }

    /// Creates a venue. No revision exists until the first edit.
    pub async fn create(&self, actor: Actor, name: &str, description: &str) -> Result<Venue> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("venue name is required".into()));
        }
        let base = slugify(name);
        let suffix = &Uuid::new_v4().simple().to_string()[..6];
        let slug = if base.is_empty() {
            suffix.to_owned()
        } else {
            format!("{base}-{suffix}")
        };
        let venue = Venue {
            id: VenueId::generate(),
            org: actor.org,
            name: name.to_owned(),
            slug,
            description: description.to_owned(),
            live_revision: None,
            draft_revision: None,
            created_at: Utc::now(),
        };
        self.stores.venues.insert(&venue).await.map_err(store_err)?;
        self.audit.record(
            actor.org,
            Some(actor.user),
            "venue.create",
            "venue",
            &venue.id.to_string(),
            serde_json::json!({ "slug": venue.slug }),
        );
        Ok(venue)
    }

    /// Lists the caller-org's venues, newest first.
    pub async fn list(
        &self,
        actor: Actor,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Venue>> {
        let limit = clamp_limit(limit, DEFAULT_PAGE, MAX_PAGE);
        let offset = offset.unwrap_or(0).max(0);
        self.stores
            .venues
            .list(actor.org, limit, offset)
            .await
            .map_err(store_err)
    }

    /// A venue by id, scoped to the caller's organization. Foreign-tenant
    /// venues read as missing rather than forbidden.
    pub async fn get(&self, actor: Actor, id: VenueId) -> Result<Venue> {
        self.stores
            .venues
            .by_id(id)
            .await
            .map_err(store_err)?
            .filter(|v| v.org == actor.org)
            .ok_or(Error::NotFound("venue"))
    }

    /// Creates an area within one of the caller-org's venues.
    pub async fn create_area(
        &self,
        actor: Actor,
        venue: VenueId,
        name: &str,
        category: &str,
    ) -> Result<Area> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("area name is required".into()));
        }
        let venue = self.get(actor, venue).await?;
        let area = Area {
            id: AreaId::generate(),
            venue: venue.id,
            name: name.to_owned(),
            category: category.to_owned(),
            created_at: Utc::now(),
        };
        self.stores.areas.insert(&area).await.map_err(store_err)?;
        self.audit.record(
            actor.org,
            Some(actor.user),
            "area.create",
            "area",
            &area.id.to_string(),
            serde_json::json!({ "venueId": venue.id }),
        );
        Ok(area)
    }

    /// Lists a venue's areas.
    pub async fn areas(&self, actor: Actor, venue: VenueId) -> Result<Vec<Area>> {
        let venue = self.get(actor, venue).await?;
        self.stores.areas.list(venue.id).await.map_err(store_err)
    }
}

#[cfg(test)]
mod tests {
    use atrium_core::{OrgId, UserId};
    use atrium_store_mem::MemBackend;

    use crate::audit::AuditTrail;

    use super::*;

    fn actor() -> Actor {
        Actor {
            user: UserId::generate(),
            org: OrgId::generate(),
        }
    }

    fn service() -> VenueService {
        let stores = MemBackend::new().stores();
        let (recorder, _worker) = AuditTrail::spawn(stores.audit.clone(), 8);
        VenueService::new(stores, recorder)
    }

    #[tokio::test]
    async fn created_venue_has_no_revisions() {
        let service = service();
        let venue = service.create(actor(), "Grand Mall", "").await.unwrap();
        assert!(venue.live_revision.is_none());
        assert!(venue.draft_revision.is_none());
        assert!(venue.slug.starts_with("grand-mall-"));
    }

    #[tokio::test]
    async fn venues_are_invisible_across_tenants() {
        let service = service();
        let venue = service.create(actor(), "Mall", "").await.unwrap();
        let err = service.get(actor(), venue.id).await.unwrap_err();
        assert_eq!(err, Error::NotFound("venue"));
    }

    #[tokio::test]
    async fn areas_attach_to_owned_venues_only() {
        let service = service();
        let owner = actor();
        let venue = service.create(owner, "Mall", "").await.unwrap();
        service
            .create_area(owner, venue.id, "Food Court", "dining")
            .await
            .unwrap();
        assert_eq!(service.areas(owner, venue.id).await.unwrap().len(), 1);

        let err = service
            .create_area(actor(), venue.id, "Sneaky", "")
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotFound("venue"));
    }
}
