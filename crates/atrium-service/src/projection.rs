// SPDX-License-Identifier: Apache-2.0
//! Manifest projections.
//!
//! Pure reads. The public manifest renders the live revision for mobile
//! clients: active floors and nodes only, full-resolution panorama URLs,
//! neighbors filtered to active edges whose target made it into the
//! document. The editor view has the same shape but draws from the draft,
//! keeps inactive elements, and serves thumbnail URLs to save authoring
//! bandwidth.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use atrium_core::media::MediaAsset;
use atrium_core::revision::EdgeKind;
use atrium_core::venue::{Area, Venue};
use atrium_core::{AreaId, AssetId, Error, NodeId, Result, VenueId};
use atrium_store::{AreaStore, MediaStore, RevisionStore, RevisionTree, Stores, VenueStore};

use crate::{store_err, Actor};

/// The mobile-consumable manifest document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDoc {
    /// Venue id.
    pub venue_id: VenueId,
    /// Venue display name.
    pub venue_name: String,
    /// When the projected revision was created.
    pub last_updated: DateTime<Utc>,
    /// Navigation entry point, when the revision has any nodes.
    pub start_node_id: Option<NodeId>,
    /// Floors ordered by level index.
    pub floors: Vec<ManifestFloor>,
}

/// One floor of the manifest.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFloor {
    /// Floor id.
    pub id: atrium_core::FloorId,
    /// Floor display name.
    pub name: String,
    /// Vertical position.
    pub level_index: i32,
    /// Floor-plan raster URL, when uploaded.
    pub map_image_url: Option<String>,
    /// Raster width in pixels.
    pub width: i32,
    /// Raster height in pixels.
    pub height: i32,
    /// Pixel-to-meter scale.
    pub pixels_per_meter: f64,
    /// Nodes on this floor.
    pub nodes: Vec<ManifestNode>,
}

/// One node of the manifest.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestNode {
    /// Node id.
    pub id: NodeId,
    /// Horizontal pixel coordinate, rounded.
    pub x: i64,
    /// Vertical pixel coordinate, rounded.
    pub y: i64,
    /// Panorama URL (full resolution publicly, thumbnail in the editor).
    pub panorama: String,
    /// Camera calibration in degrees.
    pub rotation_offset: f64,
    /// Associated area id, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<AreaId>,
    /// Associated area name, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
    /// Display label.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// Outgoing transitions.
    pub neighbors: Vec<ManifestNeighbor>,
}

/// One outgoing transition of a manifest node.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestNeighbor {
    /// Destination node.
    pub target_node_id: NodeId,
    /// Absolute compass bearing, degrees.
    pub heading: f64,
    /// Pixel distance (divide by pixelsPerMeter for meters).
    pub distance: f64,
    /// Transition classification.
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

/// Which revision a projection draws from, and how it renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    /// Live revision, active elements only, full-resolution panoramas.
    Public,
    /// Draft revision, everything included, thumbnail panoramas.
    Editor,
}

/// Manifest and editor projections.
#[derive(Clone)]
pub struct ManifestService {
    stores: Stores,
}

impl ManifestService {
    /// Builds the service over a storage bundle.
    #[must_use]
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// The public manifest for a venue slug. `NotFound` until the venue
    /// has published at least once.
    pub async fn manifest(&self, slug: &str) -> Result<ManifestDoc> {
        let venue = self
            .stores
            .venues
            .by_slug(slug)
            .await
            .map_err(store_err)?
            .ok_or(Error::NotFound("venue"))?;
        let tree = self
            .stores
            .revisions
            .live_tree(venue.id)
            .await
            .map_err(store_err)?
            .ok_or(Error::NotFound("published revision"))?;
        self.project(&venue, tree, View::Public).await
    }

    /// The editor projection of a venue's draft.
    pub async fn editor_view(&self, actor: Actor, venue: VenueId) -> Result<ManifestDoc> {
        let venue = self
            .stores
            .venues
            .by_id(venue)
            .await
            .map_err(store_err)?
            .filter(|v| v.org == actor.org)
            .ok_or(Error::NotFound("venue"))?;
        let tree = self
            .stores
            .revisions
            .draft_tree(venue.id)
            .await
            .map_err(store_err)?
            .ok_or(Error::NotFound("draft revision"))?;
        self.project(&venue, tree, View::Editor).await
    }

    async fn project(&self, venue: &Venue, mut tree: RevisionTree, view: View) -> Result<ManifestDoc> {
        tree.sort_deterministic();

        let mut asset_ids: Vec<AssetId> = tree.nodes().map(|n| n.panorama_asset).collect();
        asset_ids.extend(tree.floors.iter().filter_map(|f| f.floor.map_image));
        asset_ids.sort_unstable();
        asset_ids.dedup();
        let assets: BTreeMap<AssetId, MediaAsset> = self
            .stores
            .media
            .by_ids(&asset_ids)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let mut area_ids: Vec<AreaId> = tree.nodes().filter_map(|n| n.area).collect();
        area_ids.sort_unstable();
        area_ids.dedup();
        let areas: BTreeMap<AreaId, Area> = self
            .stores
            .areas
            .by_ids(&area_ids)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        // Targets that survive filtering; neighbors pointing elsewhere are
        // dropped so clients never chase a missing node.
        let visible: std::collections::BTreeSet<NodeId> = tree
            .floors
            .iter()
            .filter(|f| view == View::Editor || f.floor.is_active)
            .flat_map(|f| f.nodes.iter())
            .filter(|n| view == View::Editor || n.node.is_active)
            .map(|n| n.node.id)
            .collect();

        let start_node_id = tree.effective_start_node().filter(|id| visible.contains(id));

        let floors = tree
            .floors
            .iter()
            .filter(|f| view == View::Editor || f.floor.is_active)
            .map(|floor_tree| {
                let floor = &floor_tree.floor;
                let nodes = floor_tree
                    .nodes
                    .iter()
                    .filter(|n| view == View::Editor || n.node.is_active)
                    .map(|node_tree| {
                        let node = &node_tree.node;
                        let panorama = assets.get(&node.panorama_asset).map_or_else(
                            String::new,
                            |asset| match view {
                                View::Public => asset.public_url.clone(),
                                View::Editor => asset.preview_url().to_owned(),
                            },
                        );
                        let area = node.area.and_then(|id| areas.get(&id));
                        let neighbors = node_tree
                            .outgoing
                            .iter()
                            .filter(|e| view == View::Editor || e.is_active)
                            .filter(|e| visible.contains(&e.to_node))
                            .map(|e| ManifestNeighbor {
                                target_node_id: e.to_node,
                                heading: e.heading,
                                distance: e.distance,
                                kind: e.kind,
                            })
                            .collect();
                        ManifestNode {
                            id: node.id,
                            x: px(node.x),
                            y: px(node.y),
                            panorama,
                            rotation_offset: node.rotation_offset,
                            area_id: area.map(|a| a.id),
                            area_name: area.map(|a| a.name.clone()),
                            label: node.label.clone(),
                            neighbors,
                        }
                    })
                    .collect();
                ManifestFloor {
                    id: floor.id,
                    name: floor.name.clone(),
                    level_index: floor.level_index,
                    map_image_url: floor
                        .map_image
                        .and_then(|id| assets.get(&id))
                        .map(|a| a.public_url.clone()),
                    width: floor.map_width,
                    height: floor.map_height,
                    pixels_per_meter: floor.pixels_per_meter,
                    nodes,
                }
            })
            .collect();

        Ok(ManifestDoc {
            venue_id: venue.id,
            venue_name: venue.name.clone(),
            last_updated: tree.revision.created_at,
            start_node_id,
            floors,
        })
    }
}

/// Rounds a map coordinate to the integer pixel grid the manifest uses.
#[allow(clippy::cast_possible_truncation)]
fn px(value: f64) -> i64 {
    value.round() as i64
}
