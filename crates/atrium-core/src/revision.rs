// SPDX-License-Identifier: Apache-2.0
//! Graph revisions: the draft/live snapshot model.
//!
//! A revision owns its floors, floors own nodes, and nodes own their
//! outgoing edges. Floors and nodes belong to exactly one revision —
//! publishing deep-copies them — while media assets and areas are shared
//! by id across revisions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::id::{AreaId, AssetId, EdgeId, FloorId, NodeId, OrgId, RevisionId, UserId, VenueId};

/// Lifecycle state of a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionStatus {
    /// The single mutable revision of a venue.
    Draft,
    /// Immutable snapshot; one published revision is the venue's live.
    Published,
    /// Retired published revision kept for history.
    Archived,
}

impl RevisionStatus {
    /// Stable storage string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for RevisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown revision status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown revision status: {0}")]
pub struct UnknownRevisionStatus(pub String);

impl FromStr for RevisionStatus {
    type Err = UnknownRevisionStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(UnknownRevisionStatus(other.to_owned())),
        }
    }
}

/// A snapshot of a venue's floor-plan graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    /// Revision identifier.
    pub id: RevisionId,
    /// Owning organization (denormalized from the venue for scoping).
    pub org: OrgId,
    /// Owning venue.
    pub venue: VenueId,
    /// Lifecycle state.
    pub status: RevisionStatus,
    /// Free-form publish note ("v1", "fixed atrium stairs").
    pub note: String,
    /// Navigation entry point, if one was chosen.
    pub start_node: Option<NodeId>,
    /// User who created the revision.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One level of a venue within a single revision.
#[derive(Debug, Clone, PartialEq)]
pub struct Floor {
    /// Floor identifier.
    pub id: FloorId,
    /// Owning revision.
    pub revision: RevisionId,
    /// Owning venue (denormalized for reverse lookups).
    pub venue: VenueId,
    /// Display name ("Ground", "Mezzanine").
    pub name: String,
    /// Vertical ordering; negative for basements. Unique per revision.
    pub level_index: i32,
    /// Raster floor-plan image, if uploaded.
    pub map_image: Option<AssetId>,
    /// Map raster width in pixels; 0 until the image is confirmed.
    pub map_width: i32,
    /// Map raster height in pixels; 0 until the image is confirmed.
    pub map_height: i32,
    /// Scale used by clients to convert pixel distances to meters.
    pub pixels_per_meter: f64,
    /// Inactive floors are hidden from the public manifest.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A 360° panorama capture point on a floor.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node identifier.
    pub id: NodeId,
    /// Owning floor.
    pub floor: FloorId,
    /// Horizontal pixel coordinate on the floor map. Non-negative.
    pub x: f64,
    /// Vertical pixel coordinate (screen convention: grows downward).
    pub y: f64,
    /// Panorama asset shown at this position. Shared by id, never copied.
    pub panorama_asset: AssetId,
    /// Camera calibration: degrees to add so panorama-north matches map-up.
    /// Always in `[0, 360)`.
    pub rotation_offset: f64,
    /// Optional semantic region this node sits in.
    pub area: Option<AreaId>,
    /// Display label.
    pub label: String,
    /// Inactive nodes are excluded from the public manifest.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Classification of a walkable transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Same-floor walk; geometry is computed from node coordinates.
    Walk,
    /// Cross-floor stairs; geometry is zeroed.
    Stairs,
    /// Cross-floor elevator; geometry is zeroed.
    Elevator,
}

impl EdgeKind {
    /// Stable storage string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Stairs => "stairs",
            Self::Elevator => "elevator",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown edge kind string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown edge kind: {0}")]
pub struct UnknownEdgeKind(pub String);

impl FromStr for EdgeKind {
    type Err = UnknownEdgeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "walk" => Ok(Self::Walk),
            "stairs" => Ok(Self::Stairs),
            "elevator" => Ok(Self::Elevator),
            other => Err(UnknownEdgeKind(other.to_owned())),
        }
    }
}

/// A directed transition between two nodes of the same revision.
///
/// Bidirectional traversal needs two edges; no implicit inverse exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Edge identifier.
    pub id: EdgeId,
    /// Source node.
    pub from_node: NodeId,
    /// Destination node. Must live in the same revision as the source.
    pub to_node: NodeId,
    /// Absolute compass bearing in degrees, map-up = 0°, clockwise,
    /// normalized to `[0, 360)`.
    pub heading: f64,
    /// Euclidean pixel distance between the endpoints.
    pub distance: f64,
    /// Transition classification.
    pub kind: EdgeKind,
    /// Inactive edges are hidden from the public manifest.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
