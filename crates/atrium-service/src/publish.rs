// SPDX-License-Identifier: Apache-2.0
//! Publish orchestration.
//!
//! The transactional deep-copy itself lives in the revision store (and
//! its pure planning half in `atrium_store::plan`); this service adds
//! tenant scoping and the audit record.

use atrium_core::{Error, Result, RevisionId, VenueId};
use atrium_store::{RevisionStore, Stores, VenueStore};

use crate::audit::AuditRecorder;
use crate::{store_err, Actor};

/// Publishing a venue's draft to live.
#[derive(Clone)]
pub struct PublishService {
    stores: Stores,
    audit: AuditRecorder,
}

impl PublishService {
    /// Builds the service over a storage bundle.
    #[must_use]
    pub fn new(stores: Stores, audit: AuditRecorder) -> Self {
        Self { stores, audit }
    }

    /// Deep-copies the venue's draft into a new published revision and
    /// atomically swaps the live pointer. The draft survives and the edit
    /// session continues.
    pub async fn publish(&self, actor: Actor, venue: VenueId, note: &str) -> Result<RevisionId> {
        let venue_row = self
            .stores
            .venues
            .by_id(venue)
            .await
            .map_err(store_err)?
            .filter(|v| v.org == actor.org)
            .ok_or(Error::NotFound("venue"))?;

        let published = self
            .stores
            .revisions
            .publish_draft(venue_row.id, note, actor.user)
            .await
            .map_err(store_err)?;

        self.audit.record(
            actor.org,
            Some(actor.user),
            "graph.publish",
            "revision",
            &published.to_string(),
            serde_json::json!({ "venueId": venue_row.id, "note": note }),
        );
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use atrium_core::revision::RevisionStatus;
    use atrium_core::{AssetId, OrgId, UserId};
    use atrium_store_mem::MemBackend;

    use crate::audit::AuditTrail;
    use crate::editor::{EditorService, NewFloor, NewNode};
    use crate::venue::VenueService;

    use super::*;

    #[tokio::test]
    async fn publish_then_edit_then_publish_again() {
        let stores = MemBackend::new().stores();
        let (recorder, _worker) = AuditTrail::spawn(stores.audit.clone(), 64);
        let actor = Actor {
            user: UserId::generate(),
            org: OrgId::generate(),
        };
        let venues = VenueService::new(stores.clone(), recorder.clone());
        let editor = EditorService::new(stores.clone(), recorder.clone());
        let publisher = PublishService::new(stores.clone(), recorder);

        let venue = venues.create(actor, "Mall", "").await.unwrap();
        let err = publisher.publish(actor, venue.id, "v0").await.unwrap_err();
        assert_eq!(err, Error::NoDraft);

        let floor = editor
            .create_floor(
                actor,
                venue.id,
                NewFloor {
                    name: "G".into(),
                    level_index: 0,
                    map_image: None,
                    map_width: 1000,
                    map_height: 500,
                    pixels_per_meter: 10.0,
                },
            )
            .await
            .unwrap();
        editor
            .create_node(
                actor,
                NewNode {
                    floor: floor.id,
                    x: 5.0,
                    y: 5.0,
                    panorama_asset: AssetId::generate(),
                    label: String::new(),
                },
            )
            .await
            .unwrap();

        let first = publisher.publish(actor, venue.id, "v1").await.unwrap();

        // Draft is still there; a later edit lands in the same draft and
        // the next publish produces a distinct revision.
        editor
            .create_node(
                actor,
                NewNode {
                    floor: floor.id,
                    x: 6.0,
                    y: 6.0,
                    panorama_asset: AssetId::generate(),
                    label: String::new(),
                },
            )
            .await
            .unwrap();
        let second = publisher.publish(actor, venue.id, "v2").await.unwrap();
        assert_ne!(first, second);

        let history = stores.revisions.history(venue.id).await.unwrap();
        let published = history
            .iter()
            .filter(|r| r.status == RevisionStatus::Published)
            .count();
        assert_eq!(published, 2);
        let drafts = history
            .iter()
            .filter(|r| r.status == RevisionStatus::Draft)
            .count();
        assert_eq!(drafts, 1);

        let live = stores.revisions.live_tree(venue.id).await.unwrap().unwrap();
        assert_eq!(live.revision.id, second);
        assert_eq!(live.node_count(), 2);
    }

    #[tokio::test]
    async fn foreign_tenant_cannot_publish() {
        let stores = MemBackend::new().stores();
        let (recorder, _worker) = AuditTrail::spawn(stores.audit.clone(), 64);
        let owner = Actor {
            user: UserId::generate(),
            org: OrgId::generate(),
        };
        let venues = VenueService::new(stores.clone(), recorder.clone());
        let publisher = PublishService::new(stores.clone(), recorder);
        let venue = venues.create(owner, "Mall", "").await.unwrap();

        let stranger = Actor {
            user: UserId::generate(),
            org: OrgId::generate(),
        };
        let err = publisher.publish(stranger, venue.id, "").await.unwrap_err();
        assert_eq!(err, Error::NotFound("venue"));
    }
}
