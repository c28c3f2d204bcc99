// SPDX-License-Identifier: Apache-2.0
//! Identity storage capabilities: users, organizations, roles,
//! memberships, invitations.
//!
//! Operations that must be atomic across tables (registration, invitation
//! acceptance, owner-guarded membership mutations) are single trait
//! methods so each backend can wrap them in its own transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use atrium_core::org::{Invitation, Membership, Organization};
use atrium_core::rbac::{PermissionKey, Role};
use atrium_core::user::User;
use atrium_core::{InvitationId, OrgId, RoleId, UserId};

use crate::StoreResult;

/// A user's membership joined with organization and role context, as
/// needed for token minting.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipDetail {
    /// The membership row.
    pub membership: Membership,
    /// Organization display name.
    pub org_name: String,
    /// Organization slug.
    pub org_slug: String,
    /// Role name.
    pub role_name: String,
    /// Permission keys the role grants.
    pub permissions: Vec<PermissionKey>,
}

/// A member row joined with user and role context, for member listings.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDetail {
    /// Member user id.
    pub user: UserId,
    /// User display name.
    pub full_name: String,
    /// User email.
    pub email: String,
    /// Granted role id.
    pub role: RoleId,
    /// Granted role name.
    pub role_name: String,
    /// When the user joined.
    pub joined_at: DateTime<Utc>,
}

/// Users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails `Duplicate(UserEmail)` on a taken email.
    async fn insert(&self, user: &User) -> StoreResult<()>;

    /// Looks a user up by id.
    async fn by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Looks a user up by normalized email.
    async fn by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// All memberships of a user with org/role context, oldest first.
    async fn memberships_of(&self, user: UserId) -> StoreResult<Vec<MembershipDetail>>;
}

/// Organizations.
#[async_trait]
pub trait OrgStore: Send + Sync {
    /// Inserts a new organization. Fails `Duplicate(OrgSlug)` on collision.
    async fn insert(&self, org: &Organization) -> StoreResult<()>;

    /// Looks an organization up by id.
    async fn by_id(&self, id: OrgId) -> StoreResult<Option<Organization>>;

    /// Registration bundle: inserts the organization, the user, and the
    /// owner membership in one transaction. Partial success never
    /// persists.
    async fn provision(
        &self,
        org: &Organization,
        user: &User,
        owner_membership: &Membership,
    ) -> StoreResult<()>;
}

/// Roles and the permission catalog.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Inserts a role (seed or custom) with its permission set.
    async fn insert(&self, role: &Role) -> StoreResult<()>;

    /// Looks a role up by id.
    async fn by_id(&self, id: RoleId) -> StoreResult<Option<Role>>;

    /// Looks a system role up by name.
    async fn system_role(&self, name: &str) -> StoreResult<Option<Role>>;

    /// System roles plus the organization's custom roles.
    async fn roles_visible_to(&self, org: OrgId) -> StoreResult<Vec<Role>>;
}

/// Memberships. The guarded mutations lock the organization's membership
/// rows for the duration of the owner-count check-then-act.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Inserts a membership. Fails `Duplicate(Membership)` when the user
    /// is already a member.
    async fn insert(&self, membership: &Membership) -> StoreResult<()>;

    /// Looks up the membership of `user` in `org`.
    async fn get(&self, org: OrgId, user: UserId) -> StoreResult<Option<Membership>>;

    /// Lists members of an organization with user/role context.
    async fn members_of(&self, org: OrgId) -> StoreResult<Vec<MemberDetail>>;

    /// Changes a member's role. Fails `LastOwner` when the change would
    /// leave the organization without an Owner-role membership.
    async fn update_role(&self, org: OrgId, user: UserId, role: RoleId) -> StoreResult<()>;

    /// Removes a member. Fails `LastOwner` when removing the final owner.
    async fn remove(&self, org: OrgId, user: UserId) -> StoreResult<()>;
}

/// Invitations.
#[async_trait]
pub trait InvitationStore: Send + Sync {
    /// Inserts a pending invitation.
    async fn insert(&self, invitation: &Invitation) -> StoreResult<()>;

    /// Resolves an invitation by its token.
    async fn by_token(&self, token: &str) -> StoreResult<Option<Invitation>>;

    /// Whether a pending invitation already exists for (org, email).
    async fn has_pending(&self, org: OrgId, email: &str) -> StoreResult<bool>;

    /// Acceptance bundle, in one transaction: marks the invitation
    /// accepted at `accepted_at`, creates `new_user` when the invitee had
    /// no account, and inserts the membership. The invitation must still
    /// be pending or the call fails `NotFound("invitation")` (consumed
    /// concurrently).
    async fn accept(
        &self,
        id: InvitationId,
        accepted_at: DateTime<Utc>,
        new_user: Option<&User>,
        membership: &Membership,
    ) -> StoreResult<()>;
}
