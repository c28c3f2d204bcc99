// SPDX-License-Identifier: Apache-2.0
//! Row structs and row → domain conversions.
//!
//! Rows stay on plain SQL types; enum columns are TEXT and parse through
//! the domain `FromStr` impls. A row that fails to parse is surfaced as a
//! backend error — it means the table was written outside this crate.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use atrium_core::audit::AuditEntry;
use atrium_core::media::MediaAsset;
use atrium_core::org::{Invitation, Membership, Organization};
use atrium_core::rbac::{PermissionKey, Role};
use atrium_core::revision::{Edge, Floor, Node, Revision};
use atrium_core::user::User;
use atrium_core::venue::{Area, Venue};
use atrium_store::StoreError;

pub(crate) fn corrupt(what: &str, value: &str) -> StoreError {
    StoreError::Backend(format!("corrupt {what} value in storage: {value}"))
}

#[derive(FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id.into(),
            email: row.email,
            password_hash: row.password_hash,
            full_name: row.full_name,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct OrgRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<OrgRow> for Organization {
    fn from(row: OrgRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            slug: row.slug,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct RoleRow {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub is_system: bool,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RoleRow> for Role {
    type Error = StoreError;

    fn try_from(row: RoleRow) -> Result<Self, StoreError> {
        let permissions = row
            .permissions
            .iter()
            .map(|key| key.parse::<PermissionKey>().map_err(|_| corrupt("permission", key)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: row.id.into(),
            org: row.organization_id.map(Into::into),
            name: row.name,
            description: row.description,
            is_system: row.is_system,
            permissions,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct MembershipRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

impl From<MembershipRow> for Membership {
    fn from(row: MembershipRow) -> Self {
        Self {
            id: row.id.into(),
            org: row.organization_id.into(),
            user: row.user_id.into(),
            role: row.role_id.into(),
            joined_at: row.joined_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct InvitationRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub role_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub invited_by: Uuid,
    pub status: String,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<InvitationRow> for Invitation {
    type Error = StoreError;

    fn try_from(row: InvitationRow) -> Result<Self, StoreError> {
        let status = row
            .status
            .parse()
            .map_err(|_| corrupt("invitation status", &row.status))?;
        Ok(Self {
            id: row.id.into(),
            org: row.organization_id.into(),
            email: row.email,
            role: row.role_id.into(),
            token: row.token,
            expires_at: row.expires_at,
            invited_by: row.invited_by.into(),
            status,
            accepted_at: row.accepted_at,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct VenueRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub live_revision_id: Option<Uuid>,
    pub draft_revision_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<VenueRow> for Venue {
    fn from(row: VenueRow) -> Self {
        Self {
            id: row.id.into(),
            org: row.organization_id.into(),
            name: row.name,
            slug: row.slug,
            description: row.description,
            live_revision: row.live_revision_id.map(Into::into),
            draft_revision: row.draft_revision_id.map(Into::into),
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct RevisionRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub venue_id: Uuid,
    pub status: String,
    pub note: String,
    pub start_node_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RevisionRow> for Revision {
    type Error = StoreError;

    fn try_from(row: RevisionRow) -> Result<Self, StoreError> {
        let status = row
            .status
            .parse()
            .map_err(|_| corrupt("revision status", &row.status))?;
        Ok(Self {
            id: row.id.into(),
            org: row.organization_id.into(),
            venue: row.venue_id.into(),
            status,
            note: row.note,
            start_node: row.start_node_id.map(Into::into),
            created_by: row.created_by.into(),
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct FloorRow {
    pub id: Uuid,
    pub graph_revision_id: Uuid,
    pub venue_id: Uuid,
    pub name: String,
    pub level_index: i32,
    pub map_image_id: Option<Uuid>,
    pub map_width: i32,
    pub map_height: i32,
    pub pixels_per_meter: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<FloorRow> for Floor {
    fn from(row: FloorRow) -> Self {
        Self {
            id: row.id.into(),
            revision: row.graph_revision_id.into(),
            venue: row.venue_id.into(),
            name: row.name,
            level_index: row.level_index,
            map_image: row.map_image_id.map(Into::into),
            map_width: row.map_width,
            map_height: row.map_height,
            pixels_per_meter: row.pixels_per_meter,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct NodeRow {
    pub id: Uuid,
    pub floor_id: Uuid,
    pub x: f64,
    pub y: f64,
    pub panorama_asset_id: Uuid,
    pub rotation_offset: f64,
    pub area_id: Option<Uuid>,
    pub label: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NodeRow> for Node {
    fn from(row: NodeRow) -> Self {
        Self {
            id: row.id.into(),
            floor: row.floor_id.into(),
            x: row.x,
            y: row.y,
            panorama_asset: row.panorama_asset_id.into(),
            rotation_offset: row.rotation_offset,
            area: row.area_id.map(Into::into),
            label: row.label,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct EdgeRow {
    pub id: Uuid,
    pub from_node_id: Uuid,
    pub to_node_id: Uuid,
    pub heading: f64,
    pub distance: f64,
    pub kind: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EdgeRow> for Edge {
    type Error = StoreError;

    fn try_from(row: EdgeRow) -> Result<Self, StoreError> {
        let kind = row.kind.parse().map_err(|_| corrupt("edge kind", &row.kind))?;
        Ok(Self {
            id: row.id.into(),
            from_node: row.from_node_id.into(),
            to_node: row.to_node_id.into(),
            heading: row.heading,
            distance: row.distance,
            kind,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct AreaRow {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl From<AreaRow> for Area {
    fn from(row: AreaRow) -> Self {
        Self {
            id: row.id.into(),
            venue: row.venue_id.into(),
            name: row.name,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct MediaAssetRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub bucket: String,
    pub key: String,
    pub file_name: String,
    pub mime_type: String,
    pub kind: String,
    pub size_bytes: i64,
    pub width: i32,
    pub height: i32,
    pub public_url: String,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MediaAssetRow> for MediaAsset {
    type Error = StoreError;

    fn try_from(row: MediaAssetRow) -> Result<Self, StoreError> {
        let kind = row.kind.parse().map_err(|_| corrupt("media kind", &row.kind))?;
        Ok(Self {
            id: row.id.into(),
            org: row.organization_id.into(),
            bucket: row.bucket,
            key: row.key,
            file_name: row.file_name,
            mime_type: row.mime_type,
            kind,
            size_bytes: row.size_bytes,
            width: row.width,
            height: row.height,
            public_url: row.public_url,
            thumbnail_url: row.thumbnail_url,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct AuditRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub details: serde_json::Value,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        Self {
            id: row.id.into(),
            org: row.organization_id.into(),
            user: row.user_id.map(Into::into),
            action: row.action,
            entity: row.entity,
            entity_id: row.entity_id,
            details: row.details,
            ip_address: row.ip_address,
            created_at: row.created_at,
        }
    }
}
