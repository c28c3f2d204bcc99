// SPDX-License-Identifier: Apache-2.0
//! Revision and draft-graph trait implementations over Postgres.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgConnection;
use uuid::Uuid;

use atrium_core::revision::{Edge, Floor, Node, Revision};
use atrium_core::{AssetId, FloorId, NodeId, RevisionId, UserId, VenueId};
use atrium_store::{
    FloorTree, GraphWriteStore, NodeTree, PublishPlan, RevisionStore, RevisionTree, StoreError,
    StoreResult,
};

use crate::rows::{EdgeRow, FloorRow, NodeRow, RevisionRow};
use crate::{map_sqlx, PgBackend};

const REVISION_COLS: &str =
    "id, organization_id, venue_id, status, note, start_node_id, created_by, created_at";
const FLOOR_COLS: &str = "id, graph_revision_id, venue_id, name, level_index, map_image_id, \
                          map_width, map_height, pixels_per_meter, is_active, created_at";
const NODE_COLS: &str = "id, floor_id, x, y, panorama_asset_id, rotation_offset, area_id, \
                         label, is_active, created_at";
const EDGE_COLS: &str =
    "id, from_node_id, to_node_id, heading, distance, kind, is_active, created_at";

/// Loads the full tree of `revision` on one connection.
async fn load_tree(conn: &mut PgConnection, revision: RevisionId) -> StoreResult<Option<RevisionTree>> {
    let Some(revision_row) = sqlx::query_as::<_, RevisionRow>(&format!(
        "SELECT {REVISION_COLS} FROM graph_revisions WHERE id = $1"
    ))
    .bind(revision.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx)?
    else {
        return Ok(None);
    };
    let revision: Revision = revision_row.try_into()?;

    let floor_rows = sqlx::query_as::<_, FloorRow>(&format!(
        "SELECT {FLOOR_COLS} FROM floors WHERE graph_revision_id = $1"
    ))
    .bind(revision.id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(map_sqlx)?;

    let node_rows = sqlx::query_as::<_, NodeRow>(&format!(
        "SELECT n.{} FROM graph_nodes n \
         JOIN floors f ON f.id = n.floor_id \
         WHERE f.graph_revision_id = $1",
        NODE_COLS.replace(", ", ", n.")
    ))
    .bind(revision.id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(map_sqlx)?;

    let edge_rows = sqlx::query_as::<_, EdgeRow>(&format!(
        "SELECT e.{} FROM graph_edges e \
         JOIN graph_nodes n ON n.id = e.from_node_id \
         JOIN floors f ON f.id = n.floor_id \
         WHERE f.graph_revision_id = $1",
        EDGE_COLS.replace(", ", ", e.")
    ))
    .bind(revision.id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(map_sqlx)?;

    let mut edges_by_node: BTreeMap<NodeId, Vec<Edge>> = BTreeMap::new();
    for row in edge_rows {
        let edge: Edge = row.try_into()?;
        edges_by_node.entry(edge.from_node).or_default().push(edge);
    }

    let mut nodes_by_floor: BTreeMap<FloorId, Vec<NodeTree>> = BTreeMap::new();
    for row in node_rows {
        let node: Node = row.into();
        let outgoing = edges_by_node.remove(&node.id).unwrap_or_default();
        nodes_by_floor
            .entry(node.floor)
            .or_default()
            .push(NodeTree { node, outgoing });
    }

    let floors = floor_rows
        .into_iter()
        .map(|row| {
            let floor: Floor = row.into();
            let nodes = nodes_by_floor.remove(&floor.id).unwrap_or_default();
            FloorTree { floor, nodes }
        })
        .collect();

    let mut tree = RevisionTree { revision, floors };
    tree.sort_deterministic();
    Ok(Some(tree))
}

async fn insert_floor_row(conn: &mut PgConnection, floor: &Floor) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO floors \
         (id, graph_revision_id, venue_id, name, level_index, map_image_id, map_width, \
          map_height, pixels_per_meter, is_active, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(floor.id.as_uuid())
    .bind(floor.revision.as_uuid())
    .bind(floor.venue.as_uuid())
    .bind(&floor.name)
    .bind(floor.level_index)
    .bind(floor.map_image.map(|id| id.as_uuid()))
    .bind(floor.map_width)
    .bind(floor.map_height)
    .bind(floor.pixels_per_meter)
    .bind(floor.is_active)
    .bind(floor.created_at)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

async fn insert_node_row(conn: &mut PgConnection, node: &Node) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO graph_nodes \
         (id, floor_id, x, y, panorama_asset_id, rotation_offset, area_id, label, is_active, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(node.id.as_uuid())
    .bind(node.floor.as_uuid())
    .bind(node.x)
    .bind(node.y)
    .bind(node.panorama_asset.as_uuid())
    .bind(node.rotation_offset)
    .bind(node.area.map(|id| id.as_uuid()))
    .bind(&node.label)
    .bind(node.is_active)
    .bind(node.created_at)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

async fn insert_edge_row(conn: &mut PgConnection, edge: &Edge) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO graph_edges \
         (id, from_node_id, to_node_id, heading, distance, kind, is_active, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(edge.id.as_uuid())
    .bind(edge.from_node.as_uuid())
    .bind(edge.to_node.as_uuid())
    .bind(edge.heading)
    .bind(edge.distance)
    .bind(edge.kind.as_str())
    .bind(edge.is_active)
    .bind(edge.created_at)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

async fn insert_revision_row(conn: &mut PgConnection, revision: &Revision) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO graph_revisions \
         (id, organization_id, venue_id, status, note, start_node_id, created_by, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(revision.id.as_uuid())
    .bind(revision.org.as_uuid())
    .bind(revision.venue.as_uuid())
    .bind(revision.status.as_str())
    .bind(&revision.note)
    .bind(revision.start_node.map(|id| id.as_uuid()))
    .bind(revision.created_by.as_uuid())
    .bind(revision.created_at)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

#[async_trait]
impl RevisionStore for PgBackend {
    async fn create_draft(&self, draft: &Revision) -> StoreResult<()> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx)?;
        let pointer = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT draft_revision_id FROM venues WHERE id = $1 FOR UPDATE",
        )
        .bind(draft.venue.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        match pointer {
            None => return Err(StoreError::NotFound("venue")),
            Some(Some(_)) => return Err(StoreError::DraftExists),
            Some(None) => {}
        }
        insert_revision_row(&mut *tx, draft).await?;
        sqlx::query("UPDATE venues SET draft_revision_id = $1 WHERE id = $2")
            .bind(draft.id.as_uuid())
            .bind(draft.venue.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn draft_tree(&self, venue: VenueId) -> StoreResult<Option<RevisionTree>> {
        let mut conn = self.pool().acquire().await.map_err(map_sqlx)?;
        let pointer = venue_pointer(&mut *conn, venue, "draft_revision_id").await?;
        match pointer {
            Some(revision) => load_tree(&mut *conn, revision).await,
            None => Ok(None),
        }
    }

    async fn live_tree(&self, venue: VenueId) -> StoreResult<Option<RevisionTree>> {
        let mut conn = self.pool().acquire().await.map_err(map_sqlx)?;
        let pointer = venue_pointer(&mut *conn, venue, "live_revision_id").await?;
        match pointer {
            Some(revision) => load_tree(&mut *conn, revision).await,
            None => Ok(None),
        }
    }

    async fn history(&self, venue: VenueId) -> StoreResult<Vec<Revision>> {
        let rows = sqlx::query_as::<_, RevisionRow>(&format!(
            "SELECT {REVISION_COLS} FROM graph_revisions \
             WHERE venue_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(venue.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn publish_draft(
        &self,
        venue: VenueId,
        note: &str,
        actor: UserId,
    ) -> StoreResult<RevisionId> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx)?;

        // Exclusive venue-row lock: concurrent publishes serialize here.
        let pointer = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT draft_revision_id FROM venues WHERE id = $1 FOR UPDATE",
        )
        .bind(venue.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        let draft_id = match pointer {
            None => return Err(StoreError::NotFound("venue")),
            Some(None) => return Err(StoreError::NoDraft),
            Some(Some(id)) => RevisionId::from_uuid(id),
        };

        let tree = load_tree(&mut *tx, draft_id)
            .await?
            .ok_or(StoreError::NoDraft)?;
        let plan = PublishPlan::build(&tree, note, actor, Utc::now())?;

        insert_revision_row(&mut *tx, &plan.revision).await?;
        for floor in &plan.floors {
            insert_floor_row(&mut *tx, floor).await?;
        }
        for node in &plan.nodes {
            insert_node_row(&mut *tx, node).await?;
        }
        for edge in &plan.edges {
            insert_edge_row(&mut *tx, edge).await?;
        }

        // The draft pointer is deliberately left alone: the edit session
        // continues on the same draft.
        sqlx::query("UPDATE venues SET live_revision_id = $1 WHERE id = $2")
            .bind(plan.revision.id.as_uuid())
            .bind(venue.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        tracing::info!(%venue, revision = %plan.revision.id, "published revision");
        Ok(plan.revision.id)
    }

    async fn draft_by_floor(&self, floor: FloorId) -> StoreResult<Option<Revision>> {
        let row = sqlx::query_as::<_, RevisionRow>(&format!(
            "SELECT r.{} FROM graph_revisions r \
             JOIN floors f ON f.graph_revision_id = r.id \
             WHERE f.id = $1 AND r.status = 'draft'",
            REVISION_COLS.replace(", ", ", r.")
        ))
        .bind(floor.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn draft_by_node(&self, node: NodeId) -> StoreResult<Option<Revision>> {
        let row = sqlx::query_as::<_, RevisionRow>(&format!(
            "SELECT r.{} FROM graph_revisions r \
             JOIN floors f ON f.graph_revision_id = r.id \
             JOIN graph_nodes n ON n.floor_id = f.id \
             WHERE n.id = $1 AND r.status = 'draft'",
            REVISION_COLS.replace(", ", ", r.")
        ))
        .bind(node.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        row.map(TryInto::try_into).transpose()
    }
}

/// Reads one of the venue's revision pointers, failing `NotFound` when the
/// venue itself is missing.
async fn venue_pointer(
    conn: &mut PgConnection,
    venue: VenueId,
    column: &str,
) -> StoreResult<Option<RevisionId>> {
    let pointer = sqlx::query_scalar::<_, Option<Uuid>>(&format!(
        "SELECT {column} FROM venues WHERE id = $1"
    ))
    .bind(venue.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx)?;
    match pointer {
        None => Err(StoreError::NotFound("venue")),
        Some(inner) => Ok(inner.map(RevisionId::from_uuid)),
    }
}

#[async_trait]
impl GraphWriteStore for PgBackend {
    async fn insert_floor(&self, floor: &Floor) -> StoreResult<()> {
        let mut conn = self.pool().acquire().await.map_err(map_sqlx)?;
        insert_floor_row(&mut *conn, floor).await
    }

    async fn floor_by_id(&self, id: FloorId) -> StoreResult<Option<Floor>> {
        let row = sqlx::query_as::<_, FloorRow>(&format!(
            "SELECT {FLOOR_COLS} FROM floors WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn update_floor_map(
        &self,
        id: FloorId,
        map_image: Option<AssetId>,
        map_width: Option<i32>,
        map_height: Option<i32>,
        pixels_per_meter: Option<f64>,
    ) -> StoreResult<()> {
        let updated = sqlx::query(
            "UPDATE floors SET \
             map_image_id = COALESCE($2, map_image_id), \
             map_width = COALESCE($3, map_width), \
             map_height = COALESCE($4, map_height), \
             pixels_per_meter = COALESCE($5, pixels_per_meter) \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(map_image.map(|a| a.as_uuid()))
        .bind(map_width)
        .bind(map_height)
        .bind(pixels_per_meter)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound("floor"));
        }
        Ok(())
    }

    async fn insert_node(&self, node: &Node) -> StoreResult<()> {
        let mut conn = self.pool().acquire().await.map_err(map_sqlx)?;
        insert_node_row(&mut *conn, node).await
    }

    async fn node_by_id(&self, id: NodeId) -> StoreResult<Option<Node>> {
        let row = sqlx::query_as::<_, NodeRow>(&format!(
            "SELECT {NODE_COLS} FROM graph_nodes WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn update_node_position(&self, id: NodeId, x: f64, y: f64) -> StoreResult<()> {
        let updated = sqlx::query("UPDATE graph_nodes SET x = $2, y = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(x)
            .bind(y)
            .execute(self.pool())
            .await
            .map_err(map_sqlx)?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound("node"));
        }
        Ok(())
    }

    async fn update_node_calibration(&self, id: NodeId, rotation_offset: f64) -> StoreResult<()> {
        let updated = sqlx::query("UPDATE graph_nodes SET rotation_offset = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(rotation_offset)
            .execute(self.pool())
            .await
            .map_err(map_sqlx)?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound("node"));
        }
        Ok(())
    }

    async fn delete_node(&self, id: NodeId) -> StoreResult<()> {
        // FK cascade removes outgoing and inbound edges with the node.
        let deleted = sqlx::query("DELETE FROM graph_nodes WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(map_sqlx)?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound("node"));
        }
        Ok(())
    }

    async fn insert_edge(&self, edge: &Edge) -> StoreResult<()> {
        let mut conn = self.pool().acquire().await.map_err(map_sqlx)?;
        insert_edge_row(&mut *conn, edge).await
    }

    async fn delete_edge(&self, from: NodeId, to: NodeId) -> StoreResult<()> {
        let deleted =
            sqlx::query("DELETE FROM graph_edges WHERE from_node_id = $1 AND to_node_id = $2")
                .bind(from.as_uuid())
                .bind(to.as_uuid())
                .execute(self.pool())
                .await
                .map_err(map_sqlx)?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound("edge"));
        }
        Ok(())
    }
}
