// SPDX-License-Identifier: Apache-2.0
//! Draft graph editing.
//!
//! Every write resolves its target back to the venue's current draft
//! first — only draft-owned floors and nodes are mutable. A venue's first
//! edit lazily creates the draft. Concurrent edits are last-write-wins;
//! the only serialization point in the whole editing model is publish.

use chrono::Utc;

use atrium_core::geometry::{edge_distance, edge_heading, normalize_heading};
use atrium_core::revision::{Edge, EdgeKind, Floor, Node, Revision, RevisionStatus};
use atrium_core::{AssetId, EdgeId, Error, FloorId, NodeId, Result, VenueId};
use atrium_store::{GraphWriteStore, RevisionStore, Stores, VenueStore};

use crate::audit::AuditRecorder;
use crate::{store_err, Actor};

/// Inputs for floor creation.
#[derive(Debug, Clone)]
pub struct NewFloor {
    /// Display name.
    pub name: String,
    /// Vertical position; unique within the draft.
    pub level_index: i32,
    /// Floor-plan raster, when already uploaded.
    pub map_image: Option<AssetId>,
    /// Raster width in pixels (0 = unknown).
    pub map_width: i32,
    /// Raster height in pixels (0 = unknown).
    pub map_height: i32,
    /// Pixel-to-meter scale; must be positive.
    pub pixels_per_meter: f64,
}

/// Inputs for node creation.
#[derive(Debug, Clone)]
pub struct NewNode {
    /// Owning floor (must belong to the venue's draft).
    pub floor: FloorId,
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate.
    pub y: f64,
    /// Panorama shown at this position.
    pub panorama_asset: AssetId,
    /// Display label.
    pub label: String,
}

/// Draft graph editing scoped to the caller's organization.
#[derive(Clone)]
pub struct EditorService {
    stores: Stores,
    audit: AuditRecorder,
}

impl EditorService {
    /// Builds the service over a storage bundle.
    #[must_use]
    pub fn new(stores: Stores, audit: AuditRecorder) -> Self {
        Self { stores, audit }
    }

    /// The venue's draft revision, created lazily on first use.
    async fn ensure_draft(&self, actor: Actor, venue: VenueId) -> Result<Revision> {
        let venue_row = self
            .stores
            .venues
            .by_id(venue)
            .await
            .map_err(store_err)?
            .filter(|v| v.org == actor.org)
            .ok_or(Error::NotFound("venue"))?;

        if let Some(tree) = self
            .stores
            .revisions
            .draft_tree(venue_row.id)
            .await
            .map_err(store_err)?
        {
            return Ok(tree.revision);
        }

        let draft = Revision {
            id: atrium_core::RevisionId::generate(),
            org: actor.org,
            venue: venue_row.id,
            status: RevisionStatus::Draft,
            note: String::new(),
            start_node: None,
            created_by: actor.user,
            created_at: Utc::now(),
        };
        match self.stores.revisions.create_draft(&draft).await {
            Ok(()) => Ok(draft),
            // Raced with another first edit; use the winner's draft.
            Err(atrium_store::StoreError::DraftExists) => self
                .stores
                .revisions
                .draft_tree(venue_row.id)
                .await
                .map_err(store_err)?
                .map(|tree| tree.revision)
                .ok_or(Error::Internal("draft vanished after creation race".into())),
            Err(err) => Err(store_err(err)),
        }
    }

    /// Resolves the draft owning `floor`, enforcing tenant scope.
    async fn editable_floor(&self, actor: Actor, floor: FloorId) -> Result<(Revision, Floor)> {
        let revision = self
            .stores
            .revisions
            .draft_by_floor(floor)
            .await
            .map_err(store_err)?
            .ok_or(Error::NotEditable)?;
        if revision.org != actor.org {
            return Err(Error::NotFound("floor"));
        }
        let floor = self
            .stores
            .graph
            .floor_by_id(floor)
            .await
            .map_err(store_err)?
            .ok_or(Error::NotFound("floor"))?;
        Ok((revision, floor))
    }

    /// Resolves the draft owning `node`, enforcing tenant scope.
    async fn editable_node(&self, actor: Actor, node: NodeId) -> Result<(Revision, Node)> {
        let revision = self
            .stores
            .revisions
            .draft_by_node(node)
            .await
            .map_err(store_err)?
            .ok_or(Error::NotEditable)?;
        if revision.org != actor.org {
            return Err(Error::NotFound("node"));
        }
        let node = self
            .stores
            .graph
            .node_by_id(node)
            .await
            .map_err(store_err)?
            .ok_or(Error::NotFound("node"))?;
        Ok((revision, node))
    }

    /// Appends a floor to the venue's draft (created lazily).
    pub async fn create_floor(&self, actor: Actor, venue: VenueId, params: NewFloor) -> Result<Floor> {
        if params.name.trim().is_empty() {
            return Err(Error::InvalidInput("floor name is required".into()));
        }
        if params.pixels_per_meter <= 0.0 {
            return Err(Error::InvalidInput("pixelsPerMeter must be positive".into()));
        }
        if params.map_width < 0 || params.map_height < 0 {
            return Err(Error::InvalidInput("map dimensions must be non-negative".into()));
        }
        let draft = self.ensure_draft(actor, venue).await?;
        let floor = Floor {
            id: FloorId::generate(),
            revision: draft.id,
            venue,
            name: params.name.trim().to_owned(),
            level_index: params.level_index,
            map_image: params.map_image,
            map_width: params.map_width,
            map_height: params.map_height,
            pixels_per_meter: params.pixels_per_meter,
            is_active: true,
            created_at: Utc::now(),
        };
        self.stores.graph.insert_floor(&floor).await.map_err(store_err)?;
        self.audit.record(
            actor.org,
            Some(actor.user),
            "floor.create",
            "floor",
            &floor.id.to_string(),
            serde_json::json!({ "venueId": venue, "levelIndex": floor.level_index }),
        );
        Ok(floor)
    }

    /// Partial floor update: map image and/or scale.
    pub async fn update_floor_map(
        &self,
        actor: Actor,
        floor: FloorId,
        map_image: Option<AssetId>,
        map_width: Option<i32>,
        map_height: Option<i32>,
        pixels_per_meter: Option<f64>,
    ) -> Result<()> {
        if let Some(scale) = pixels_per_meter {
            if scale <= 0.0 {
                return Err(Error::InvalidInput("pixelsPerMeter must be positive".into()));
            }
        }
        if map_width.is_some_and(|w| w < 0) || map_height.is_some_and(|h| h < 0) {
            return Err(Error::InvalidInput("map dimensions must be non-negative".into()));
        }
        let (_, floor_row) = self.editable_floor(actor, floor).await?;
        self.stores
            .graph
            .update_floor_map(floor_row.id, map_image, map_width, map_height, pixels_per_meter)
            .await
            .map_err(store_err)
    }

    /// Inserts a node on a draft-owned floor.
    pub async fn create_node(&self, actor: Actor, params: NewNode) -> Result<Node> {
        let (_, floor) = self.editable_floor(actor, params.floor).await?;
        check_bounds(&floor, params.x, params.y)?;
        let node = Node {
            id: NodeId::generate(),
            floor: floor.id,
            x: params.x,
            y: params.y,
            panorama_asset: params.panorama_asset,
            rotation_offset: 0.0,
            area: None,
            label: params.label,
            is_active: true,
            created_at: Utc::now(),
        };
        self.stores.graph.insert_node(&node).await.map_err(store_err)?;
        self.audit.record(
            actor.org,
            Some(actor.user),
            "node.create",
            "node",
            &node.id.to_string(),
            serde_json::json!({ "floorId": floor.id }),
        );
        Ok(node)
    }

    /// Moves a draft-owned node.
    pub async fn update_node_position(
        &self,
        actor: Actor,
        node: NodeId,
        x: f64,
        y: f64,
    ) -> Result<()> {
        let (_, node_row) = self.editable_node(actor, node).await?;
        let floor = self
            .stores
            .graph
            .floor_by_id(node_row.floor)
            .await
            .map_err(store_err)?
            .ok_or(Error::NotFound("floor"))?;
        check_bounds(&floor, x, y)?;
        self.stores
            .graph
            .update_node_position(node_row.id, x, y)
            .await
            .map_err(store_err)
    }

    /// Sets a node's panorama rotation offset, normalized to `[0, 360)`.
    pub async fn update_node_calibration(
        &self,
        actor: Actor,
        node: NodeId,
        rotation_offset: f64,
    ) -> Result<()> {
        if !rotation_offset.is_finite() {
            return Err(Error::InvalidInput("rotationOffset must be finite".into()));
        }
        let (_, node_row) = self.editable_node(actor, node).await?;
        self.stores
            .graph
            .update_node_calibration(node_row.id, normalize_heading(rotation_offset))
            .await
            .map_err(store_err)
    }

    /// Deletes a draft-owned node with all incident edges.
    pub async fn delete_node(&self, actor: Actor, node: NodeId) -> Result<()> {
        let (_, node_row) = self.editable_node(actor, node).await?;
        self.stores
            .graph
            .delete_node(node_row.id)
            .await
            .map_err(store_err)?;
        self.audit.record(
            actor.org,
            Some(actor.user),
            "node.delete",
            "node",
            &node_row.id.to_string(),
            serde_json::Value::Null,
        );
        Ok(())
    }

    /// Connects two nodes of the same draft with a directed edge.
    ///
    /// Same-floor edges get computed geometry; cross-floor edges must be
    /// stairs or elevators and carry zeroed geometry. No inverse edge is
    /// created implicitly.
    pub async fn connect_nodes(
        &self,
        actor: Actor,
        from: NodeId,
        to: NodeId,
        kind: Option<EdgeKind>,
    ) -> Result<Edge> {
        if from == to {
            return Err(Error::SelfLoop);
        }
        let (from_revision, from_node) = self.editable_node(actor, from).await?;
        let (to_revision, to_node) = self.editable_node(actor, to).await?;
        if from_revision.id != to_revision.id {
            return Err(Error::InvalidInput(
                "nodes belong to different drafts".into(),
            ));
        }

        let same_floor = from_node.floor == to_node.floor;
        let kind = kind.unwrap_or(EdgeKind::Walk);
        let (heading, distance) = if same_floor {
            (
                edge_heading((from_node.x, from_node.y), (to_node.x, to_node.y)),
                edge_distance((from_node.x, from_node.y), (to_node.x, to_node.y)),
            )
        } else {
            if kind == EdgeKind::Walk {
                return Err(Error::InvalidInput(
                    "cross-floor connections must be stairs or elevator".into(),
                ));
            }
            (0.0, 0.0)
        };

        let edge = Edge {
            id: EdgeId::generate(),
            from_node: from_node.id,
            to_node: to_node.id,
            heading,
            distance,
            kind,
            is_active: true,
            created_at: Utc::now(),
        };
        self.stores.graph.insert_edge(&edge).await.map_err(store_err)?;
        self.audit.record(
            actor.org,
            Some(actor.user),
            "edge.create",
            "edge",
            &edge.id.to_string(),
            serde_json::json!({ "from": from, "to": to }),
        );
        Ok(edge)
    }

    /// Removes the single directed edge `from → to`.
    pub async fn delete_edge(&self, actor: Actor, from: NodeId, to: NodeId) -> Result<()> {
        let (_, from_node) = self.editable_node(actor, from).await?;
        self.stores
            .graph
            .delete_edge(from_node.id, to)
            .await
            .map_err(store_err)
    }

    /// All revisions of a venue, newest first.
    pub async fn history(
        &self,
        actor: Actor,
        venue: VenueId,
    ) -> Result<Vec<Revision>> {
        let venue_row = self
            .stores
            .venues
            .by_id(venue)
            .await
            .map_err(store_err)?
            .filter(|v| v.org == actor.org)
            .ok_or(Error::NotFound("venue"))?;
        self.stores
            .revisions
            .history(venue_row.id)
            .await
            .map_err(store_err)
    }
}

/// Coordinates must be non-negative; upper bounds apply only once the
/// floor's raster dimensions are known.
fn check_bounds(floor: &Floor, x: f64, y: f64) -> Result<()> {
    if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
        return Err(Error::InvalidInput("coordinates must be non-negative".into()));
    }
    if floor.map_width > 0 && x > f64::from(floor.map_width) {
        return Err(Error::InvalidInput("x exceeds the floor map width".into()));
    }
    if floor.map_height > 0 && y > f64::from(floor.map_height) {
        return Err(Error::InvalidInput("y exceeds the floor map height".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use atrium_core::{OrgId, UserId};
    use atrium_store_mem::MemBackend;

    use crate::audit::AuditTrail;
    use crate::venue::VenueService;

    use super::*;

    struct Rig {
        editor: EditorService,
        venues: VenueService,
        actor: Actor,
        stores: Stores,
    }

    fn rig() -> Rig {
        let stores = MemBackend::new().stores();
        let (recorder, _worker) = AuditTrail::spawn(stores.audit.clone(), 64);
        Rig {
            editor: EditorService::new(stores.clone(), recorder.clone()),
            venues: VenueService::new(stores.clone(), recorder),
            actor: Actor {
                user: UserId::generate(),
                org: OrgId::generate(),
            },
            stores,
        }
    }

    fn floor_params(level: i32) -> NewFloor {
        NewFloor {
            name: format!("L{level}"),
            level_index: level,
            map_image: None,
            map_width: 1000,
            map_height: 500,
            pixels_per_meter: 10.0,
        }
    }

    #[tokio::test]
    async fn first_edit_lazily_creates_the_draft() {
        let rig = rig();
        let venue = rig.venues.create(rig.actor, "Mall", "").await.unwrap();
        assert!(venue.draft_revision.is_none());

        rig.editor
            .create_floor(rig.actor, venue.id, floor_params(1))
            .await
            .unwrap();

        let venue = rig.stores.venues.by_id(venue.id).await.unwrap().unwrap();
        assert!(venue.draft_revision.is_some());
    }

    #[tokio::test]
    async fn duplicate_level_index_conflicts() {
        let rig = rig();
        let venue = rig.venues.create(rig.actor, "Mall", "").await.unwrap();
        rig.editor
            .create_floor(rig.actor, venue.id, floor_params(1))
            .await
            .unwrap();
        let err = rig
            .editor
            .create_floor(rig.actor, venue.id, floor_params(1))
            .await
            .unwrap_err();
        assert_eq!(err, Error::DuplicateLevelIndex);
    }

    #[tokio::test]
    async fn same_floor_connection_gets_computed_geometry() {
        let rig = rig();
        let venue = rig.venues.create(rig.actor, "Mall", "").await.unwrap();
        let floor = rig
            .editor
            .create_floor(rig.actor, venue.id, floor_params(1))
            .await
            .unwrap();
        let a = rig
            .editor
            .create_node(
                rig.actor,
                NewNode {
                    floor: floor.id,
                    x: 100.0,
                    y: 100.0,
                    panorama_asset: AssetId::generate(),
                    label: String::new(),
                },
            )
            .await
            .unwrap();
        let b = rig
            .editor
            .create_node(
                rig.actor,
                NewNode {
                    floor: floor.id,
                    x: 200.0,
                    y: 200.0,
                    panorama_asset: AssetId::generate(),
                    label: String::new(),
                },
            )
            .await
            .unwrap();

        let edge = rig
            .editor
            .connect_nodes(rig.actor, a.id, b.id, None)
            .await
            .unwrap();
        assert!((edge.heading - 135.0).abs() < 1e-4);
        assert!((edge.distance - 141.4213562373095).abs() < 1e-6);
        assert_eq!(edge.kind, EdgeKind::Walk);

        // No implicit inverse.
        let tree = rig
            .stores
            .revisions
            .draft_tree(venue.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tree.edges().count(), 1);
    }

    #[tokio::test]
    async fn cross_floor_walk_is_rejected_and_lift_zeroes_geometry() {
        let rig = rig();
        let venue = rig.venues.create(rig.actor, "Mall", "").await.unwrap();
        let ground = rig
            .editor
            .create_floor(rig.actor, venue.id, floor_params(0))
            .await
            .unwrap();
        let upper = rig
            .editor
            .create_floor(rig.actor, venue.id, floor_params(1))
            .await
            .unwrap();
        let a = rig
            .editor
            .create_node(
                rig.actor,
                NewNode {
                    floor: ground.id,
                    x: 10.0,
                    y: 10.0,
                    panorama_asset: AssetId::generate(),
                    label: String::new(),
                },
            )
            .await
            .unwrap();
        let b = rig
            .editor
            .create_node(
                rig.actor,
                NewNode {
                    floor: upper.id,
                    x: 20.0,
                    y: 20.0,
                    panorama_asset: AssetId::generate(),
                    label: String::new(),
                },
            )
            .await
            .unwrap();

        let err = rig
            .editor
            .connect_nodes(rig.actor, a.id, b.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let edge = rig
            .editor
            .connect_nodes(rig.actor, a.id, b.id, Some(EdgeKind::Elevator))
            .await
            .unwrap();
        assert_eq!(edge.heading, 0.0);
        assert_eq!(edge.distance, 0.0);
    }

    #[tokio::test]
    async fn self_loop_is_rejected() {
        let rig = rig();
        let venue = rig.venues.create(rig.actor, "Mall", "").await.unwrap();
        let floor = rig
            .editor
            .create_floor(rig.actor, venue.id, floor_params(1))
            .await
            .unwrap();
        let a = rig
            .editor
            .create_node(
                rig.actor,
                NewNode {
                    floor: floor.id,
                    x: 1.0,
                    y: 1.0,
                    panorama_asset: AssetId::generate(),
                    label: String::new(),
                },
            )
            .await
            .unwrap();
        let err = rig
            .editor
            .connect_nodes(rig.actor, a.id, a.id, None)
            .await
            .unwrap_err();
        assert_eq!(err, Error::SelfLoop);
    }

    #[tokio::test]
    async fn nodes_in_different_venues_cannot_connect() {
        let rig = rig();
        let venue_a = rig.venues.create(rig.actor, "A", "").await.unwrap();
        let venue_b = rig.venues.create(rig.actor, "B", "").await.unwrap();
        let fa = rig
            .editor
            .create_floor(rig.actor, venue_a.id, floor_params(1))
            .await
            .unwrap();
        let fb = rig
            .editor
            .create_floor(rig.actor, venue_b.id, floor_params(1))
            .await
            .unwrap();
        let a = rig
            .editor
            .create_node(
                rig.actor,
                NewNode {
                    floor: fa.id,
                    x: 1.0,
                    y: 1.0,
                    panorama_asset: AssetId::generate(),
                    label: String::new(),
                },
            )
            .await
            .unwrap();
        let b = rig
            .editor
            .create_node(
                rig.actor,
                NewNode {
                    floor: fb.id,
                    x: 2.0,
                    y: 2.0,
                    panorama_asset: AssetId::generate(),
                    label: String::new(),
                },
            )
            .await
            .unwrap();
        let err = rig
            .editor
            .connect_nodes(rig.actor, a.id, b.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn out_of_bounds_nodes_are_rejected() {
        let rig = rig();
        let venue = rig.venues.create(rig.actor, "Mall", "").await.unwrap();
        let floor = rig
            .editor
            .create_floor(rig.actor, venue.id, floor_params(1))
            .await
            .unwrap();
        for (x, y) in [(-1.0, 10.0), (10.0, -1.0), (1001.0, 10.0), (10.0, 501.0)] {
            let err = rig
                .editor
                .create_node(
                    rig.actor,
                    NewNode {
                        floor: floor.id,
                        x,
                        y,
                        panorama_asset: AssetId::generate(),
                        label: String::new(),
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "({x}, {y})");
        }
    }

    #[tokio::test]
    async fn calibration_normalizes_into_range() {
        let rig = rig();
        let venue = rig.venues.create(rig.actor, "Mall", "").await.unwrap();
        let floor = rig
            .editor
            .create_floor(rig.actor, venue.id, floor_params(1))
            .await
            .unwrap();
        let node = rig
            .editor
            .create_node(
                rig.actor,
                NewNode {
                    floor: floor.id,
                    x: 1.0,
                    y: 1.0,
                    panorama_asset: AssetId::generate(),
                    label: String::new(),
                },
            )
            .await
            .unwrap();
        rig.editor
            .update_node_calibration(rig.actor, node.id, -90.0)
            .await
            .unwrap();
        let stored = rig.stores.graph.node_by_id(node.id).await.unwrap().unwrap();
        assert!((stored.rotation_offset - 270.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn published_rows_are_not_editable() {
        let rig = rig();
        let venue = rig.venues.create(rig.actor, "Mall", "").await.unwrap();
        let floor = rig
            .editor
            .create_floor(rig.actor, venue.id, floor_params(1))
            .await
            .unwrap();
        let node = rig
            .editor
            .create_node(
                rig.actor,
                NewNode {
                    floor: floor.id,
                    x: 1.0,
                    y: 1.0,
                    panorama_asset: AssetId::generate(),
                    label: String::new(),
                },
            )
            .await
            .unwrap();
        rig.stores
            .revisions
            .publish_draft(venue.id, "v1", rig.actor.user)
            .await
            .unwrap();

        // The draft node stays editable; its published copy does not.
        rig.editor
            .update_node_position(rig.actor, node.id, 2.0, 2.0)
            .await
            .unwrap();
        let live = rig
            .stores
            .revisions
            .live_tree(venue.id)
            .await
            .unwrap()
            .unwrap();
        let copied = live.nodes().next().unwrap();
        let err = rig
            .editor
            .update_node_position(rig.actor, copied.id, 3.0, 3.0)
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotEditable);
    }
}
