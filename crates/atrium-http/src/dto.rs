// SPDX-License-Identifier: Apache-2.0
//! Wire DTOs. JSON object keys are camelCase; query parameters are
//! snake_case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atrium_core::media::MediaKind;
use atrium_core::rbac::Role;
use atrium_core::revision::{Edge, EdgeKind, Floor, Node, Revision, RevisionStatus};
use atrium_core::venue::{Area, Venue};
use atrium_core::{
    AreaId, AssetId, EdgeId, FloorId, NodeId, OrgId, RevisionId, RoleId, UserId, VenueId,
};

// ── Auth ────────────────────────────────────────────────────────────

/// `POST /auth/register` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name.
    pub full_name: String,
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// New organization's name.
    pub organization_name: String,
}

/// `POST /auth/login` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// `POST /auth/invite/accept` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInviteRequest {
    /// Invitation token.
    pub token: String,
    /// Password for a newly created account (ignored for existing users).
    #[serde(default)]
    pub password: String,
    /// Display name for a newly created account.
    #[serde(default)]
    pub full_name: String,
}

// ── Venues & areas ──────────────────────────────────────────────────

/// `POST /venues` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVenueRequest {
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Venue payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueResponse {
    /// Venue id.
    pub id: VenueId,
    /// Display name.
    pub name: String,
    /// Public slug.
    pub slug: String,
    /// Description.
    pub description: String,
    /// Live revision pointer.
    pub live_revision_id: Option<RevisionId>,
    /// Draft revision pointer.
    pub draft_revision_id: Option<RevisionId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Venue> for VenueResponse {
    fn from(venue: Venue) -> Self {
        Self {
            id: venue.id,
            name: venue.name,
            slug: venue.slug,
            description: venue.description,
            live_revision_id: venue.live_revision,
            draft_revision_id: venue.draft_revision,
            created_at: venue.created_at,
        }
    }
}

/// Offset pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    /// Page size (default 10, max 100).
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
}

/// `POST /areas` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAreaRequest {
    /// Owning venue.
    pub venue_id: VenueId,
    /// Display name.
    pub name: String,
    /// Classification for icons/filtering.
    #[serde(default)]
    pub category: String,
}

/// Area payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaResponse {
    /// Area id.
    pub id: AreaId,
    /// Owning venue.
    pub venue_id: VenueId,
    /// Display name.
    pub name: String,
    /// Classification.
    pub category: String,
}

impl From<Area> for AreaResponse {
    fn from(area: Area) -> Self {
        Self {
            id: area.id,
            venue_id: area.venue,
            name: area.name,
            category: area.category,
        }
    }
}

// ── Graph editor ────────────────────────────────────────────────────

/// `POST /editor/floors` query parameters.
#[derive(Debug, Deserialize)]
pub struct FloorQuery {
    /// Target venue.
    pub venue_id: VenueId,
}

/// `POST /editor/floors` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFloorRequest {
    /// Display name.
    pub name: String,
    /// Vertical position (may be negative).
    pub level_index: i32,
    /// Floor-plan raster asset.
    #[serde(default)]
    pub map_image_id: Option<AssetId>,
    /// Raster width in pixels.
    #[serde(default)]
    pub width: i32,
    /// Raster height in pixels.
    #[serde(default)]
    pub height: i32,
    /// Pixel-to-meter scale.
    pub pixels_per_meter: f64,
}

/// `PUT /editor/floors/{id}/map` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFloorMapRequest {
    /// New floor-plan raster asset.
    #[serde(default)]
    pub map_image_id: Option<AssetId>,
    /// New raster width.
    #[serde(default)]
    pub width: Option<i32>,
    /// New raster height.
    #[serde(default)]
    pub height: Option<i32>,
    /// New scale.
    #[serde(default)]
    pub pixels_per_meter: Option<f64>,
}

/// Floor payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorResponse {
    /// Floor id.
    pub id: FloorId,
    /// Owning revision.
    pub revision_id: RevisionId,
    /// Display name.
    pub name: String,
    /// Vertical position.
    pub level_index: i32,
    /// Raster asset, when set.
    pub map_image_id: Option<AssetId>,
    /// Raster width in pixels.
    pub width: i32,
    /// Raster height in pixels.
    pub height: i32,
    /// Pixel-to-meter scale.
    pub pixels_per_meter: f64,
}

impl From<Floor> for FloorResponse {
    fn from(floor: Floor) -> Self {
        Self {
            id: floor.id,
            revision_id: floor.revision,
            name: floor.name,
            level_index: floor.level_index,
            map_image_id: floor.map_image,
            width: floor.map_width,
            height: floor.map_height,
            pixels_per_meter: floor.pixels_per_meter,
        }
    }
}

/// `POST /editor/nodes` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    /// Owning floor (must be draft-owned).
    pub floor_id: FloorId,
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate.
    pub y: f64,
    /// Panorama asset.
    pub panorama_asset_id: AssetId,
    /// Display label.
    #[serde(default)]
    pub label: String,
}

/// Node payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResponse {
    /// Node id.
    pub id: NodeId,
    /// Owning floor.
    pub floor_id: FloorId,
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate.
    pub y: f64,
    /// Panorama asset.
    pub panorama_asset_id: AssetId,
    /// Calibration in degrees.
    pub rotation_offset: f64,
    /// Display label.
    pub label: String,
}

impl From<Node> for NodeResponse {
    fn from(node: Node) -> Self {
        Self {
            id: node.id,
            floor_id: node.floor,
            x: node.x,
            y: node.y,
            panorama_asset_id: node.panorama_asset,
            rotation_offset: node.rotation_offset,
            label: node.label,
        }
    }
}

/// `PUT /editor/nodes/{id}/position` body.
#[derive(Debug, Deserialize)]
pub struct UpdatePositionRequest {
    /// New horizontal pixel coordinate.
    pub x: f64,
    /// New vertical pixel coordinate.
    pub y: f64,
}

/// `PUT /editor/nodes/{id}/calibration` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationRequest {
    /// New rotation offset in degrees (normalized server-side).
    pub rotation_offset: f64,
}

/// `POST /editor/connections` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    /// Source node.
    pub from_node_id: NodeId,
    /// Destination node.
    pub to_node_id: NodeId,
    /// Transition classification; defaults to walk.
    #[serde(default, rename = "type")]
    pub kind: Option<EdgeKind>,
}

/// `DELETE /editor/connections` query parameters.
#[derive(Debug, Deserialize)]
pub struct DisconnectQuery {
    /// Source node.
    pub from: NodeId,
    /// Destination node.
    pub to: NodeId,
}

/// Edge payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeResponse {
    /// Edge id.
    pub id: EdgeId,
    /// Source node.
    pub from_node_id: NodeId,
    /// Destination node.
    pub to_node_id: NodeId,
    /// Absolute bearing in degrees.
    pub heading: f64,
    /// Pixel distance.
    pub distance: f64,
    /// Transition classification.
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl From<Edge> for EdgeResponse {
    fn from(edge: Edge) -> Self {
        Self {
            id: edge.id,
            from_node_id: edge.from_node,
            to_node_id: edge.to_node,
            heading: edge.heading,
            distance: edge.distance,
            kind: edge.kind,
        }
    }
}

/// `POST /editor/{venue_id}/publish` body.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    /// Free-form note stored on the published revision.
    #[serde(default)]
    pub note: String,
}

/// Publish result payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    /// The newly published (now live) revision.
    pub revision_id: RevisionId,
}

/// Revision history item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSummary {
    /// Revision id.
    pub id: RevisionId,
    /// Lifecycle state.
    pub status: RevisionStatus,
    /// Publish note.
    pub note: String,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Revision> for RevisionSummary {
    fn from(revision: Revision) -> Self {
        Self {
            id: revision.id,
            status: revision.status,
            note: revision.note,
            created_by: revision.created_by,
            created_at: revision.created_at,
        }
    }
}

// ── Organization & roles ────────────────────────────────────────────

/// `POST /orgs/{org_id}/invite` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    /// Invitee email.
    pub email: String,
    /// Role granted on acceptance.
    pub role_id: RoleId,
}

/// `PATCH /orgs/{org_id}/members` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRoleRequest {
    /// Member to change.
    pub user_id: UserId,
    /// New role.
    pub role_id: RoleId,
}

/// Member listing item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    /// Member user id.
    pub user_id: UserId,
    /// Display name.
    pub full_name: String,
    /// Email.
    pub email: String,
    /// Role id.
    pub role_id: RoleId,
    /// Role name.
    pub role_name: String,
    /// Join timestamp.
    pub joined_at: DateTime<Utc>,
}

impl From<atrium_store::MemberDetail> for MemberResponse {
    fn from(member: atrium_store::MemberDetail) -> Self {
        Self {
            user_id: member.user,
            full_name: member.full_name,
            email: member.email,
            role_id: member.role,
            role_name: member.role_name,
            joined_at: member.joined_at,
        }
    }
}

/// `POST /roles` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    /// Role name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Granted permission keys (wire strings).
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Role payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    /// Role id.
    pub id: RoleId,
    /// Owning org (absent for system roles).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrgId>,
    /// Role name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Whether this is a seeded system role.
    pub is_system: bool,
    /// Granted permission keys.
    pub permissions: Vec<atrium_core::rbac::PermissionKey>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            organization_id: role.org,
            name: role.name,
            description: role.description,
            is_system: role.is_system,
            permissions: role.permissions,
        }
    }
}

// ── Media ───────────────────────────────────────────────────────────

/// `POST /media/upload-init` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInitRequest {
    /// Client file name.
    pub file_name: String,
    /// Declared MIME type.
    pub file_type: String,
    /// Upload category.
    pub category: MediaKind,
    /// Declared size in bytes.
    pub file_size: i64,
}

/// `POST /media/confirm` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmUploadRequest {
    /// Asset minted by upload-init.
    pub asset_id: AssetId,
    /// Measured pixel width.
    pub width: i32,
    /// Measured pixel height.
    pub height: i32,
}

// ── Audit ───────────────────────────────────────────────────────────

/// `GET /audit-logs` query parameters.
#[derive(Debug, Deserialize)]
pub struct AuditParams {
    /// Resume cursor from a previous page.
    pub cursor: Option<String>,
    /// Page size (default 20, max 100).
    pub limit: Option<i64>,
    /// Filter by exact action name.
    pub action: Option<String>,
    /// Filter by acting user.
    pub user_id: Option<UserId>,
}

/// Audit listing item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryResponse {
    /// Entry id.
    pub id: atrium_core::AuditId,
    /// Acting user, when known.
    pub user_id: Option<UserId>,
    /// Action name.
    pub action: String,
    /// Touched entity class.
    pub entity: String,
    /// Touched entity id.
    pub entity_id: String,
    /// Structured context.
    pub details: serde_json::Value,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<atrium_core::audit::AuditEntry> for AuditEntryResponse {
    fn from(entry: atrium_core::audit::AuditEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user,
            action: entry.action,
            entity: entry.entity,
            entity_id: entry.entity_id,
            details: entry.details,
            created_at: entry.created_at,
        }
    }
}

/// Audit page payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPageResponse {
    /// Entries, newest first.
    pub entries: Vec<AuditEntryResponse>,
    /// Cursor for the next page, when more rows exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
