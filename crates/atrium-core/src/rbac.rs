// SPDX-License-Identifier: Apache-2.0
//! Permission catalog, roles, and the seeded system roles.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::id::{OrgId, RoleId};

/// Keyed capability gating a single class of operation.
///
/// Keys are stable wire strings of the form `"{group}:{verb}"`; they appear
/// verbatim inside session-token claims, so renaming a variant is a breaking
/// protocol change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum PermissionKey {
    /// Create new venues.
    #[serde(rename = "venue:create")]
    VenueCreate,
    /// Update venue details.
    #[serde(rename = "venue:update")]
    VenueUpdate,
    /// Delete venues.
    #[serde(rename = "venue:delete")]
    VenueDelete,
    /// Edit draft nodes and edges.
    #[serde(rename = "graph:edit")]
    GraphEdit,
    /// Publish a draft to live.
    #[serde(rename = "graph:publish")]
    GraphPublish,
    /// Manage the organization profile.
    #[serde(rename = "org:settings")]
    OrgSettings,
    /// Manage billing and subscription.
    #[serde(rename = "org:billing")]
    OrgBilling,
    /// Invite new members.
    #[serde(rename = "team:invite")]
    TeamInvite,
    /// Change member roles and remove members.
    #[serde(rename = "team:manage")]
    TeamManage,
    /// Upload new media assets.
    #[serde(rename = "media:upload")]
    MediaUpload,
}

impl PermissionKey {
    /// Every key defined by the system, in catalog order.
    pub const ALL: [Self; 10] = [
        Self::VenueCreate,
        Self::VenueUpdate,
        Self::VenueDelete,
        Self::GraphEdit,
        Self::GraphPublish,
        Self::OrgSettings,
        Self::OrgBilling,
        Self::TeamInvite,
        Self::TeamManage,
        Self::MediaUpload,
    ];

    /// Stable wire string for this key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VenueCreate => "venue:create",
            Self::VenueUpdate => "venue:update",
            Self::VenueDelete => "venue:delete",
            Self::GraphEdit => "graph:edit",
            Self::GraphPublish => "graph:publish",
            Self::OrgSettings => "org:settings",
            Self::OrgBilling => "org:billing",
            Self::TeamInvite => "team:invite",
            Self::TeamManage => "team:manage",
            Self::MediaUpload => "media:upload",
        }
    }

    /// Display group used to cluster keys in role-editor UIs.
    #[must_use]
    pub const fn group(self) -> &'static str {
        match self {
            Self::VenueCreate | Self::VenueUpdate | Self::VenueDelete => "CMS",
            Self::GraphEdit | Self::GraphPublish => "Graph",
            Self::OrgSettings | Self::OrgBilling => "Org",
            Self::TeamInvite | Self::TeamManage => "Team",
            Self::MediaUpload => "Media",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::VenueCreate => "Create new venues",
            Self::VenueUpdate => "Update venue details",
            Self::VenueDelete => "Delete venues",
            Self::GraphEdit => "Edit nodes and edges",
            Self::GraphPublish => "Publish draft to live",
            Self::OrgSettings => "Manage organization profile",
            Self::OrgBilling => "Manage billing and subscription",
            Self::TeamInvite => "Invite new members",
            Self::TeamManage => "Change member roles",
            Self::MediaUpload => "Upload new assets",
        }
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown permission key string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission key: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for PermissionKey {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_owned()))
    }
}

/// Named bundle of permissions.
///
/// System roles have `org == None`, are seeded at bootstrap, and are
/// immutable; custom roles are scoped to the owning organization.
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,
    /// Owning organization; `None` marks a shared system role.
    pub org: Option<OrgId>,
    /// Role name, unique among system roles.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// `true` for the seeded Owner/Editor/Viewer roles.
    pub is_system: bool,
    /// Permission keys granted by this role, sorted by catalog order.
    pub permissions: Vec<PermissionKey>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// The three seeded system roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemRole {
    /// Holds every defined permission; at least one per organization.
    Owner,
    /// Content management without org administration.
    Editor,
    /// Read-only.
    Viewer,
}

impl SystemRole {
    /// All system roles, in seeding order.
    pub const ALL: [Self; 3] = [Self::Owner, Self::Editor, Self::Viewer];

    /// Canonical role name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Editor => "Editor",
            Self::Viewer => "Viewer",
        }
    }

    /// Seeded description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Owner => "Organization owner",
            Self::Editor => "Content and map editor",
            Self::Viewer => "Read-only access",
        }
    }

    /// Permission keys granted to this role.
    #[must_use]
    pub fn permissions(self) -> Vec<PermissionKey> {
        match self {
            Self::Owner => PermissionKey::ALL.to_vec(),
            Self::Editor => vec![
                PermissionKey::VenueCreate,
                PermissionKey::VenueUpdate,
                PermissionKey::GraphEdit,
                PermissionKey::GraphPublish,
                PermissionKey::MediaUpload,
            ],
            Self::Viewer => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_strings() {
        for key in PermissionKey::ALL {
            assert_eq!(key.as_str().parse::<PermissionKey>(), Ok(key));
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!("graph:reticulate".parse::<PermissionKey>().is_err());
    }

    #[test]
    fn owner_holds_every_permission() {
        assert_eq!(SystemRole::Owner.permissions(), PermissionKey::ALL.to_vec());
    }

    #[test]
    fn viewer_holds_none() {
        assert!(SystemRole::Viewer.permissions().is_empty());
    }

    #[test]
    fn serde_uses_wire_strings() {
        let json = serde_json::to_string(&PermissionKey::GraphPublish).unwrap();
        assert_eq!(json, "\"graph:publish\"");
    }
}
