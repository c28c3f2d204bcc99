// SPDX-License-Identifier: Apache-2.0
//! Identity trait implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use atrium_core::org::{Invitation, InvitationStatus, Membership, Organization};
use atrium_core::rbac::Role;
use atrium_core::user::User;
use atrium_core::{InvitationId, OrgId, RoleId, UserId};
use atrium_store::{
    Constraint, InvitationStore, MemberDetail, MembershipDetail, MembershipStore, OrgStore,
    RoleStore, StoreError, StoreResult, UserStore,
};

use crate::{MemBackend, Tables};

impl Tables {
    fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|u| u.email == email)
    }

    fn org_slug_taken(&self, slug: &str) -> bool {
        self.orgs.values().any(|o| o.slug == slug)
    }

    fn membership_of(&self, org: OrgId, user: UserId) -> Option<&Membership> {
        self.memberships
            .values()
            .find(|m| m.org == org && m.user == user)
    }

    /// Whether `role` is the seeded system Owner role.
    fn is_owner_role(&self, role: RoleId) -> bool {
        self.roles
            .get(&role)
            .is_some_and(|r| r.is_system && r.name == "Owner")
    }

    /// Owner-membership count in `org`, excluding `except`.
    fn owner_count_excluding(&self, org: OrgId, except: UserId) -> usize {
        self.memberships
            .values()
            .filter(|m| m.org == org && m.user != except && self.is_owner_role(m.role))
            .count()
    }
}

#[async_trait]
impl UserStore for MemBackend {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut t = self.tables();
        if t.email_taken(&user.email) {
            return Err(StoreError::Duplicate(Constraint::UserEmail));
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn memberships_of(&self, user: UserId) -> StoreResult<Vec<MembershipDetail>> {
        let t = self.tables();
        let mut details: Vec<MembershipDetail> = t
            .memberships
            .values()
            .filter(|m| m.user == user)
            .filter_map(|m| {
                let org = t.orgs.get(&m.org)?;
                let role = t.roles.get(&m.role)?;
                Some(MembershipDetail {
                    membership: m.clone(),
                    org_name: org.name.clone(),
                    org_slug: org.slug.clone(),
                    role_name: role.name.clone(),
                    permissions: role.permissions.clone(),
                })
            })
            .collect();
        details.sort_by_key(|d| (d.membership.joined_at, d.membership.id));
        Ok(details)
    }
}

#[async_trait]
impl OrgStore for MemBackend {
    async fn insert(&self, org: &Organization) -> StoreResult<()> {
        let mut t = self.tables();
        if t.org_slug_taken(&org.slug) {
            return Err(StoreError::Duplicate(Constraint::OrgSlug));
        }
        t.orgs.insert(org.id, org.clone());
        Ok(())
    }

    async fn by_id(&self, id: OrgId) -> StoreResult<Option<Organization>> {
        Ok(self.tables().orgs.get(&id).cloned())
    }

    async fn provision(
        &self,
        org: &Organization,
        user: &User,
        owner_membership: &Membership,
    ) -> StoreResult<()> {
        let mut t = self.tables();
        // All checks, then all writes: the bundle persists entirely or not
        // at all.
        if t.email_taken(&user.email) {
            return Err(StoreError::Duplicate(Constraint::UserEmail));
        }
        if t.org_slug_taken(&org.slug) {
            return Err(StoreError::Duplicate(Constraint::OrgSlug));
        }
        t.orgs.insert(org.id, org.clone());
        t.users.insert(user.id, user.clone());
        t.memberships
            .insert(owner_membership.id, owner_membership.clone());
        Ok(())
    }
}

#[async_trait]
impl RoleStore for MemBackend {
    async fn insert(&self, role: &Role) -> StoreResult<()> {
        self.tables().roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn by_id(&self, id: RoleId) -> StoreResult<Option<Role>> {
        Ok(self.tables().roles.get(&id).cloned())
    }

    async fn system_role(&self, name: &str) -> StoreResult<Option<Role>> {
        Ok(self
            .tables()
            .roles
            .values()
            .find(|r| r.is_system && r.name == name)
            .cloned())
    }

    async fn roles_visible_to(&self, org: OrgId) -> StoreResult<Vec<Role>> {
        let t = self.tables();
        let mut roles: Vec<Role> = t
            .roles
            .values()
            .filter(|r| r.is_system || r.org == Some(org))
            .cloned()
            .collect();
        roles.sort_by_key(|r| (!r.is_system, r.name.clone()));
        Ok(roles)
    }
}

#[async_trait]
impl MembershipStore for MemBackend {
    async fn insert(&self, membership: &Membership) -> StoreResult<()> {
        let mut t = self.tables();
        if t.membership_of(membership.org, membership.user).is_some() {
            return Err(StoreError::Duplicate(Constraint::Membership));
        }
        t.memberships.insert(membership.id, membership.clone());
        Ok(())
    }

    async fn get(&self, org: OrgId, user: UserId) -> StoreResult<Option<Membership>> {
        Ok(self.tables().membership_of(org, user).cloned())
    }

    async fn members_of(&self, org: OrgId) -> StoreResult<Vec<MemberDetail>> {
        let t = self.tables();
        let mut members: Vec<MemberDetail> = t
            .memberships
            .values()
            .filter(|m| m.org == org)
            .filter_map(|m| {
                let user = t.users.get(&m.user)?;
                let role = t.roles.get(&m.role)?;
                Some(MemberDetail {
                    user: m.user,
                    full_name: user.full_name.clone(),
                    email: user.email.clone(),
                    role: m.role,
                    role_name: role.name.clone(),
                    joined_at: m.joined_at,
                })
            })
            .collect();
        members.sort_by_key(|m| (m.joined_at, m.user));
        Ok(members)
    }

    async fn update_role(&self, org: OrgId, user: UserId, role: RoleId) -> StoreResult<()> {
        let mut t = self.tables();
        let current = t
            .membership_of(org, user)
            .ok_or(StoreError::NotFound("membership"))?
            .clone();
        let demoting_owner = t.is_owner_role(current.role) && !t.is_owner_role(role);
        if demoting_owner && t.owner_count_excluding(org, user) == 0 {
            return Err(StoreError::LastOwner);
        }
        if let Some(m) = t.memberships.get_mut(&current.id) {
            m.role = role;
        }
        Ok(())
    }

    async fn remove(&self, org: OrgId, user: UserId) -> StoreResult<()> {
        let mut t = self.tables();
        let current = t
            .membership_of(org, user)
            .ok_or(StoreError::NotFound("membership"))?
            .clone();
        if t.is_owner_role(current.role) && t.owner_count_excluding(org, user) == 0 {
            return Err(StoreError::LastOwner);
        }
        t.memberships.remove(&current.id);
        Ok(())
    }
}

#[async_trait]
impl InvitationStore for MemBackend {
    async fn insert(&self, invitation: &Invitation) -> StoreResult<()> {
        let mut t = self.tables();
        if t.invitations.values().any(|i| i.token == invitation.token) {
            return Err(StoreError::Duplicate(Constraint::InvitationToken));
        }
        t.invitations.insert(invitation.id, invitation.clone());
        Ok(())
    }

    async fn by_token(&self, token: &str) -> StoreResult<Option<Invitation>> {
        Ok(self
            .tables()
            .invitations
            .values()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn has_pending(&self, org: OrgId, email: &str) -> StoreResult<bool> {
        Ok(self.tables().invitations.values().any(|i| {
            i.org == org && i.email == email && i.status == InvitationStatus::Pending
        }))
    }

    async fn accept(
        &self,
        id: InvitationId,
        accepted_at: DateTime<Utc>,
        new_user: Option<&User>,
        membership: &Membership,
    ) -> StoreResult<()> {
        let mut t = self.tables();
        let pending = t
            .invitations
            .get(&id)
            .is_some_and(|i| i.status == InvitationStatus::Pending);
        if !pending {
            return Err(StoreError::NotFound("invitation"));
        }
        if let Some(user) = new_user {
            if t.email_taken(&user.email) {
                return Err(StoreError::Duplicate(Constraint::UserEmail));
            }
        }
        if t.membership_of(membership.org, membership.user).is_some() {
            return Err(StoreError::Duplicate(Constraint::Membership));
        }
        if let Some(user) = new_user {
            t.users.insert(user.id, user.clone());
        }
        t.memberships.insert(membership.id, membership.clone());
        if let Some(invitation) = t.invitations.get_mut(&id) {
            invitation.status = InvitationStatus::Accepted;
            invitation.accepted_at = Some(accepted_at);
        }
        Ok(())
    }
}
