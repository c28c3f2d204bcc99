// SPDX-License-Identifier: Apache-2.0
//! Revision and draft-graph trait implementations.

use async_trait::async_trait;
use chrono::Utc;

use atrium_core::revision::{Edge, Floor, Node, Revision, RevisionStatus};
use atrium_core::{AssetId, FloorId, NodeId, RevisionId, UserId, VenueId};
use atrium_store::{
    Constraint, FloorTree, GraphWriteStore, NodeTree, PublishPlan, RevisionStore, RevisionTree,
    StoreError, StoreResult,
};

use crate::{MemBackend, Tables};

impl Tables {
    /// Assembles the eager tree for `revision`.
    fn load_tree(&self, revision: RevisionId) -> Option<RevisionTree> {
        let revision = self.revisions.get(&revision)?.clone();
        let floors = self
            .floors
            .values()
            .filter(|f| f.revision == revision.id)
            .map(|floor| {
                let nodes = self
                    .nodes
                    .values()
                    .filter(|n| n.floor == floor.id)
                    .map(|node| {
                        let outgoing = self
                            .edges
                            .values()
                            .filter(|e| e.from_node == node.id)
                            .cloned()
                            .collect();
                        NodeTree {
                            node: node.clone(),
                            outgoing,
                        }
                    })
                    .collect();
                FloorTree {
                    floor: floor.clone(),
                    nodes,
                }
            })
            .collect();
        let mut tree = RevisionTree { revision, floors };
        tree.sort_deterministic();
        Some(tree)
    }

    fn revision_of_floor(&self, floor: FloorId) -> Option<&Revision> {
        let floor = self.floors.get(&floor)?;
        self.revisions.get(&floor.revision)
    }
}

#[async_trait]
impl RevisionStore for MemBackend {
    async fn create_draft(&self, draft: &Revision) -> StoreResult<()> {
        let mut t = self.tables();
        let venue = t
            .venues
            .get(&draft.venue)
            .ok_or(StoreError::NotFound("venue"))?;
        if venue.draft_revision.is_some() {
            return Err(StoreError::DraftExists);
        }
        t.revisions.insert(draft.id, draft.clone());
        if let Some(v) = t.venues.get_mut(&draft.venue) {
            v.draft_revision = Some(draft.id);
        }
        Ok(())
    }

    async fn draft_tree(&self, venue: VenueId) -> StoreResult<Option<RevisionTree>> {
        let t = self.tables();
        let Some(venue) = t.venues.get(&venue) else {
            return Err(StoreError::NotFound("venue"));
        };
        Ok(venue.draft_revision.and_then(|id| t.load_tree(id)))
    }

    async fn live_tree(&self, venue: VenueId) -> StoreResult<Option<RevisionTree>> {
        let t = self.tables();
        let Some(venue) = t.venues.get(&venue) else {
            return Err(StoreError::NotFound("venue"));
        };
        Ok(venue.live_revision.and_then(|id| t.load_tree(id)))
    }

    async fn history(&self, venue: VenueId) -> StoreResult<Vec<Revision>> {
        let t = self.tables();
        let mut revisions: Vec<Revision> = t
            .revisions
            .values()
            .filter(|r| r.venue == venue)
            .cloned()
            .collect();
        revisions.sort_by_key(|r| std::cmp::Reverse((r.created_at, r.id)));
        Ok(revisions)
    }

    async fn publish_draft(
        &self,
        venue: VenueId,
        note: &str,
        actor: UserId,
    ) -> StoreResult<RevisionId> {
        let mut t = self.tables();
        let venue_row = t.venues.get(&venue).ok_or(StoreError::NotFound("venue"))?;
        let draft_id = venue_row.draft_revision.ok_or(StoreError::NoDraft)?;
        let tree = t.load_tree(draft_id).ok_or(StoreError::NoDraft)?;

        // Plan first; nothing below can fail, so a planning error leaves
        // the tables untouched — same contract as the SQL transaction.
        let plan = PublishPlan::build(&tree, note, actor, Utc::now())?;

        let new_id = plan.revision.id;
        t.revisions.insert(new_id, plan.revision);
        for floor in plan.floors {
            t.floors.insert(floor.id, floor);
        }
        for node in plan.nodes {
            t.nodes.insert(node.id, node);
        }
        for edge in plan.edges {
            t.edges.insert(edge.id, edge);
        }
        if let Some(v) = t.venues.get_mut(&venue) {
            v.live_revision = Some(new_id);
        }
        Ok(new_id)
    }

    async fn draft_by_floor(&self, floor: FloorId) -> StoreResult<Option<Revision>> {
        let t = self.tables();
        Ok(t.revision_of_floor(floor)
            .filter(|r| r.status == RevisionStatus::Draft)
            .cloned())
    }

    async fn draft_by_node(&self, node: NodeId) -> StoreResult<Option<Revision>> {
        let t = self.tables();
        let Some(node) = t.nodes.get(&node) else {
            return Ok(None);
        };
        Ok(t.revision_of_floor(node.floor)
            .filter(|r| r.status == RevisionStatus::Draft)
            .cloned())
    }
}

#[async_trait]
impl GraphWriteStore for MemBackend {
    async fn insert_floor(&self, floor: &Floor) -> StoreResult<()> {
        let mut t = self.tables();
        let level_taken = t
            .floors
            .values()
            .any(|f| f.revision == floor.revision && f.level_index == floor.level_index);
        if level_taken {
            return Err(StoreError::Duplicate(Constraint::FloorLevel));
        }
        t.floors.insert(floor.id, floor.clone());
        Ok(())
    }

    async fn floor_by_id(&self, id: FloorId) -> StoreResult<Option<Floor>> {
        Ok(self.tables().floors.get(&id).cloned())
    }

    async fn update_floor_map(
        &self,
        id: FloorId,
        map_image: Option<AssetId>,
        map_width: Option<i32>,
        map_height: Option<i32>,
        pixels_per_meter: Option<f64>,
    ) -> StoreResult<()> {
        let mut t = self.tables();
        let floor = t.floors.get_mut(&id).ok_or(StoreError::NotFound("floor"))?;
        if let Some(asset) = map_image {
            floor.map_image = Some(asset);
        }
        if let Some(width) = map_width {
            floor.map_width = width;
        }
        if let Some(height) = map_height {
            floor.map_height = height;
        }
        if let Some(scale) = pixels_per_meter {
            floor.pixels_per_meter = scale;
        }
        Ok(())
    }

    async fn insert_node(&self, node: &Node) -> StoreResult<()> {
        self.tables().nodes.insert(node.id, node.clone());
        Ok(())
    }

    async fn node_by_id(&self, id: NodeId) -> StoreResult<Option<Node>> {
        Ok(self.tables().nodes.get(&id).cloned())
    }

    async fn update_node_position(&self, id: NodeId, x: f64, y: f64) -> StoreResult<()> {
        let mut t = self.tables();
        let node = t.nodes.get_mut(&id).ok_or(StoreError::NotFound("node"))?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    async fn update_node_calibration(&self, id: NodeId, rotation_offset: f64) -> StoreResult<()> {
        let mut t = self.tables();
        let node = t.nodes.get_mut(&id).ok_or(StoreError::NotFound("node"))?;
        node.rotation_offset = rotation_offset;
        Ok(())
    }

    async fn delete_node(&self, id: NodeId) -> StoreResult<()> {
        let mut t = self.tables();
        if t.nodes.remove(&id).is_none() {
            return Err(StoreError::NotFound("node"));
        }
        // Outgoing and inbound edges go in the same step.
        t.edges.retain(|_, e| e.from_node != id && e.to_node != id);
        Ok(())
    }

    async fn insert_edge(&self, edge: &Edge) -> StoreResult<()> {
        self.tables().edges.insert(edge.id, edge.clone());
        Ok(())
    }

    async fn delete_edge(&self, from: NodeId, to: NodeId) -> StoreResult<()> {
        let mut t = self.tables();
        let found = t
            .edges
            .iter()
            .find(|(_, e)| e.from_node == from && e.to_node == to)
            .map(|(id, _)| *id);
        let id = found.ok_or(StoreError::NotFound("edge"))?;
        t.edges.remove(&id);
        Ok(())
    }
}
