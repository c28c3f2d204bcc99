// SPDX-License-Identifier: Apache-2.0
//! Tenants, memberships, and invitations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::id::{InvitationId, MembershipId, OrgId, RoleId, UserId};

/// A tenant. Owns venues, media assets, custom roles, and its members.
#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    /// Organization identifier.
    pub id: OrgId,
    /// Display name.
    pub name: String,
    /// URL-safe slug, unique across the system.
    pub slug: String,
    /// Deactivated organizations reject logins and invitations.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Ties a user to an organization under a role.
///
/// Unique on (org, user). Every active organization keeps at least one
/// membership whose role is Owner; mutations that would break that fail.
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    /// Membership identifier.
    pub id: MembershipId,
    /// Owning organization.
    pub org: OrgId,
    /// Member user.
    pub user: UserId,
    /// Granted role.
    pub role: RoleId,
    /// When the user joined.
    pub joined_at: DateTime<Utc>,
}

/// Lifecycle of an invitation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Issued and unconsumed.
    Pending,
    /// Consumed; a membership was materialized.
    Accepted,
    /// Withdrawn by an admin before acceptance.
    Revoked,
    /// Passed its expiry unconsumed.
    Expired,
}

impl InvitationStatus {
    /// Stable storage string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown invitation status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown invitation status: {0}")]
pub struct UnknownInvitationStatus(pub String);

impl FromStr for InvitationStatus {
    type Err = UnknownInvitationStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "revoked" => Ok(Self::Revoked),
            "expired" => Ok(Self::Expired),
            other => Err(UnknownInvitationStatus(other.to_owned())),
        }
    }
}

/// A pending offer of membership, keyed by a single-use random token.
#[derive(Debug, Clone, PartialEq)]
pub struct Invitation {
    /// Invitation identifier.
    pub id: InvitationId,
    /// Inviting organization.
    pub org: OrgId,
    /// Invitee email (normalized).
    pub email: String,
    /// Role the membership will carry on acceptance.
    pub role: RoleId,
    /// Single-use 256-bit token, URL-safe base64.
    pub token: String,
    /// Hard expiry; pending invitations past this are rejected.
    pub expires_at: DateTime<Utc>,
    /// Member who issued the invitation.
    pub invited_by: UserId,
    /// Lifecycle state. Only `pending → accepted/revoked/expired` happens.
    pub status: InvitationStatus,
    /// Set when the token is consumed.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Whether this invitation can still be consumed at `now`.
    #[must_use]
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn invitation(status: InvitationStatus, expires_at: DateTime<Utc>) -> Invitation {
        Invitation {
            id: InvitationId::generate(),
            org: OrgId::generate(),
            email: "p@example.com".into(),
            role: RoleId::generate(),
            token: "tok".into(),
            expires_at,
            invited_by: UserId::generate(),
            status,
            accepted_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pending_unexpired_is_usable() {
        let now = Utc::now();
        assert!(invitation(InvitationStatus::Pending, now + Duration::hours(1)).is_usable(now));
    }

    #[test]
    fn expired_or_consumed_is_not_usable() {
        let now = Utc::now();
        assert!(!invitation(InvitationStatus::Pending, now - Duration::seconds(1)).is_usable(now));
        assert!(!invitation(InvitationStatus::Accepted, now + Duration::hours(1)).is_usable(now));
        assert!(!invitation(InvitationStatus::Revoked, now + Duration::hours(1)).is_usable(now));
    }
}
