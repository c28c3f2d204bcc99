// SPDX-License-Identifier: Apache-2.0
//! Revision storage and draft graph writes.
//!
//! Two capabilities: [`RevisionStore`] owns revision lifecycle — draft
//! creation, tree loads, history, and the transactional publish —
//! while [`GraphWriteStore`] owns row-level draft mutations. The editor
//! authorizes every write through the reverse lookups here before
//! touching a row.

use async_trait::async_trait;

use atrium_core::revision::{Edge, Floor, Node, Revision};
use atrium_core::{AssetId, FloorId, NodeId, RevisionId, UserId, VenueId};

use crate::tree::RevisionTree;
use crate::StoreResult;

/// Revision lifecycle and loads.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Creates a draft revision and atomically points the venue's
    /// `draft_revision` at it. Fails `DraftExists` when the venue already
    /// has one.
    async fn create_draft(&self, draft: &Revision) -> StoreResult<()>;

    /// Loads the venue's draft with floors, nodes, and outgoing edges
    /// eagerly resolved. `None` when no draft exists.
    async fn draft_tree(&self, venue: VenueId) -> StoreResult<Option<RevisionTree>>;

    /// Loads the venue's live revision tree via its live pointer. `None`
    /// until the first publish.
    async fn live_tree(&self, venue: VenueId) -> StoreResult<Option<RevisionTree>>;

    /// All revisions of a venue, newest first.
    async fn history(&self, venue: VenueId) -> StoreResult<Vec<Revision>>;

    /// The transactional publish: locks the venue row, loads the draft
    /// tree, executes the deep-copy plan, and atomically swaps the live
    /// pointer. The draft record and the venue's draft pointer survive.
    ///
    /// Fails `NoDraft` when the venue has no draft and `DanglingEdge`
    /// when the copy finds an edge endpoint outside the revision; on any
    /// failure nothing persists.
    async fn publish_draft(
        &self,
        venue: VenueId,
        note: &str,
        actor: UserId,
    ) -> StoreResult<RevisionId>;

    /// Reverse lookup: the draft owning `floor`, if the floor belongs to
    /// a draft revision.
    async fn draft_by_floor(&self, floor: FloorId) -> StoreResult<Option<Revision>>;

    /// Reverse lookup: the draft owning `node`, via its floor.
    async fn draft_by_node(&self, node: NodeId) -> StoreResult<Option<Revision>>;
}

/// Row-level draft graph writes.
///
/// Callers must have authorized the write against the owning draft first;
/// these methods do not re-check revision status.
#[async_trait]
pub trait GraphWriteStore: Send + Sync {
    /// Appends a floor. Fails `Duplicate(FloorLevel)` when the revision
    /// already has a floor at that level index.
    async fn insert_floor(&self, floor: &Floor) -> StoreResult<()>;

    /// Looks a floor up by id.
    async fn floor_by_id(&self, id: FloorId) -> StoreResult<Option<Floor>>;

    /// Partial floor update: map image and/or scale.
    async fn update_floor_map(
        &self,
        id: FloorId,
        map_image: Option<AssetId>,
        map_width: Option<i32>,
        map_height: Option<i32>,
        pixels_per_meter: Option<f64>,
    ) -> StoreResult<()>;

    /// Inserts a node.
    async fn insert_node(&self, node: &Node) -> StoreResult<()>;

    /// Looks a node up by id.
    async fn node_by_id(&self, id: NodeId) -> StoreResult<Option<Node>>;

    /// Moves a node.
    async fn update_node_position(&self, id: NodeId, x: f64, y: f64) -> StoreResult<()>;

    /// Sets a node's rotation offset (already normalized by the caller).
    async fn update_node_calibration(&self, id: NodeId, rotation_offset: f64) -> StoreResult<()>;

    /// Deletes a node and, in the same transaction, both its outgoing
    /// edges and any edges pointing at it from elsewhere.
    async fn delete_node(&self, id: NodeId) -> StoreResult<()>;

    /// Inserts a directed edge.
    async fn insert_edge(&self, edge: &Edge) -> StoreResult<()>;

    /// Deletes the single directed edge `from → to`. Fails
    /// `NotFound("edge")` when absent.
    async fn delete_edge(&self, from: NodeId, to: NodeId) -> StoreResult<()>;
}
