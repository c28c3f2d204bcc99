// SPDX-License-Identifier: Apache-2.0
//! Identity trait implementations over Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use atrium_core::org::{Invitation, Membership, Organization};
use atrium_core::rbac::{PermissionKey, Role};
use atrium_core::user::User;
use atrium_core::{InvitationId, OrgId, RoleId, UserId};
use atrium_store::{
    InvitationStore, MemberDetail, MembershipDetail, MembershipStore, OrgStore, RoleStore,
    StoreError, StoreResult, UserStore,
};

use crate::rows::{corrupt, InvitationRow, MembershipRow, OrgRow, RoleRow, UserRow};
use crate::{map_sqlx, PgBackend};

const USER_COLS: &str = "id, email, password_hash, full_name, created_at";
const ROLE_COLS: &str = "id, organization_id, name, description, is_system, permissions, created_at";
const INVITATION_COLS: &str =
    "id, organization_id, email, role_id, token, expires_at, invited_by, status, accepted_at, created_at";

async fn insert_user(
    conn: &mut sqlx::PgConnection,
    user: &User,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, full_name, created_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user.id.as_uuid())
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.full_name)
    .bind(user.created_at)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

async fn insert_membership(
    conn: &mut sqlx::PgConnection,
    membership: &Membership,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO memberships (id, organization_id, user_id, role_id, joined_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(membership.id.as_uuid())
    .bind(membership.org.as_uuid())
    .bind(membership.user.as_uuid())
    .bind(membership.role.as_uuid())
    .bind(membership.joined_at)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

#[async_trait]
impl UserStore for PgBackend {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut conn = self.pool().acquire().await.map_err(map_sqlx)?;
        insert_user(&mut *conn, user).await
    }

    async fn by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLS} FROM users WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn memberships_of(&self, user: UserId) -> StoreResult<Vec<MembershipDetail>> {
        #[derive(FromRow)]
        struct DetailRow {
            id: Uuid,
            organization_id: Uuid,
            user_id: Uuid,
            role_id: Uuid,
            joined_at: DateTime<Utc>,
            org_name: String,
            org_slug: String,
            role_name: String,
            permissions: Vec<String>,
        }

        let rows = sqlx::query_as::<_, DetailRow>(
            "SELECT m.id, m.organization_id, m.user_id, m.role_id, m.joined_at, \
                    o.name AS org_name, o.slug AS org_slug, \
                    r.name AS role_name, r.permissions \
             FROM memberships m \
             JOIN organizations o ON o.id = m.organization_id \
             JOIN roles r ON r.id = m.role_id \
             WHERE m.user_id = $1 \
             ORDER BY m.joined_at, m.id",
        )
        .bind(user.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;

        rows.into_iter()
            .map(|row| {
                let permissions = row
                    .permissions
                    .iter()
                    .map(|key| {
                        key.parse::<PermissionKey>()
                            .map_err(|_| corrupt("permission", key))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(MembershipDetail {
                    membership: Membership {
                        id: row.id.into(),
                        org: row.organization_id.into(),
                        user: row.user_id.into(),
                        role: row.role_id.into(),
                        joined_at: row.joined_at,
                    },
                    org_name: row.org_name,
                    org_slug: row.org_slug,
                    role_name: row.role_name,
                    permissions,
                })
            })
            .collect()
    }
}

#[async_trait]
impl OrgStore for PgBackend {
    async fn insert(&self, org: &Organization) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO organizations (id, name, slug, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(org.id.as_uuid())
        .bind(&org.name)
        .bind(&org.slug)
        .bind(org.is_active)
        .bind(org.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn by_id(&self, id: OrgId) -> StoreResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrgRow>(
            "SELECT id, name, slug, is_active, created_at FROM organizations WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn provision(
        &self,
        org: &Organization,
        user: &User,
        owner_membership: &Membership,
    ) -> StoreResult<()> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx)?;
        sqlx::query(
            "INSERT INTO organizations (id, name, slug, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(org.id.as_uuid())
        .bind(&org.name)
        .bind(&org.slug)
        .bind(org.is_active)
        .bind(org.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        insert_user(&mut *tx, user).await?;
        insert_membership(&mut *tx, owner_membership).await?;
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }
}

#[async_trait]
impl RoleStore for PgBackend {
    async fn insert(&self, role: &Role) -> StoreResult<()> {
        let permissions: Vec<String> = role
            .permissions
            .iter()
            .map(|key| key.as_str().to_owned())
            .collect();
        sqlx::query(
            "INSERT INTO roles (id, organization_id, name, description, is_system, permissions, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(role.id.as_uuid())
        .bind(role.org.map(|org| org.as_uuid()))
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.is_system)
        .bind(&permissions)
        .bind(role.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn by_id(&self, id: RoleId) -> StoreResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLS} FROM roles WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn system_role(&self, name: &str) -> StoreResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLS} FROM roles WHERE is_system AND name = $1"
        ))
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn roles_visible_to(&self, org: OrgId) -> StoreResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLS} FROM roles \
             WHERE is_system OR organization_id = $1 \
             ORDER BY is_system DESC, name"
        ))
        .bind(org.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// Joined membership + role row used by the guarded mutations.
#[derive(FromRow)]
struct LockedMemberRow {
    id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
    role_name: String,
    role_is_system: bool,
}

impl LockedMemberRow {
    fn is_owner(&self) -> bool {
        self.role_is_system && self.role_name == "Owner"
    }
}

/// Locks and returns the organization's membership rows.
///
/// `FOR UPDATE OF m` pins the membership rows (not the joined role rows)
/// for the duration of the check-then-act.
async fn lock_members(
    tx: &mut sqlx::PgConnection,
    org: OrgId,
) -> StoreResult<Vec<LockedMemberRow>> {
    sqlx::query_as::<_, LockedMemberRow>(
        "SELECT m.id, m.user_id, m.role_id, r.name AS role_name, r.is_system AS role_is_system \
         FROM memberships m \
         JOIN roles r ON r.id = m.role_id \
         WHERE m.organization_id = $1 \
         FOR UPDATE OF m",
    )
    .bind(org.as_uuid())
    .fetch_all(tx)
    .await
    .map_err(map_sqlx)
}

#[async_trait]
impl MembershipStore for PgBackend {
    async fn insert(&self, membership: &Membership) -> StoreResult<()> {
        let mut conn = self.pool().acquire().await.map_err(map_sqlx)?;
        insert_membership(&mut *conn, membership).await
    }

    async fn get(&self, org: OrgId, user: UserId) -> StoreResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            "SELECT id, organization_id, user_id, role_id, joined_at \
             FROM memberships WHERE organization_id = $1 AND user_id = $2",
        )
        .bind(org.as_uuid())
        .bind(user.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Into::into))
    }

    async fn members_of(&self, org: OrgId) -> StoreResult<Vec<MemberDetail>> {
        #[derive(FromRow)]
        struct DetailRow {
            user_id: Uuid,
            full_name: String,
            email: String,
            role_id: Uuid,
            role_name: String,
            joined_at: DateTime<Utc>,
        }

        let rows = sqlx::query_as::<_, DetailRow>(
            "SELECT m.user_id, u.full_name, u.email, m.role_id, r.name AS role_name, m.joined_at \
             FROM memberships m \
             JOIN users u ON u.id = m.user_id \
             JOIN roles r ON r.id = m.role_id \
             WHERE m.organization_id = $1 \
             ORDER BY m.joined_at, m.id",
        )
        .bind(org.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx)?;

        Ok(rows
            .into_iter()
            .map(|row| MemberDetail {
                user: row.user_id.into(),
                full_name: row.full_name,
                email: row.email,
                role: row.role_id.into(),
                role_name: row.role_name,
                joined_at: row.joined_at,
            })
            .collect())
    }

    async fn update_role(&self, org: OrgId, user: UserId, role: RoleId) -> StoreResult<()> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx)?;
        let members = lock_members(&mut *tx, org).await?;
        let target = members
            .iter()
            .find(|m| m.user_id == user.as_uuid())
            .ok_or(StoreError::NotFound("membership"))?;

        if target.is_owner() && target.role_id != role.as_uuid() {
            let other_owners = members
                .iter()
                .filter(|m| m.user_id != user.as_uuid() && m.is_owner())
                .count();
            // Demoting to anything only counts when the new role is not
            // Owner itself; resolving the new role here keeps the check
            // inside the lock.
            let new_is_owner = sqlx::query_scalar::<_, bool>(
                "SELECT is_system AND name = 'Owner' FROM roles WHERE id = $1",
            )
            .bind(role.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx)?
            .unwrap_or(false);
            if !new_is_owner && other_owners == 0 {
                return Err(StoreError::LastOwner);
            }
        }

        sqlx::query("UPDATE memberships SET role_id = $1 WHERE id = $2")
            .bind(role.as_uuid())
            .bind(target.id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn remove(&self, org: OrgId, user: UserId) -> StoreResult<()> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx)?;
        let members = lock_members(&mut *tx, org).await?;
        let target = members
            .iter()
            .find(|m| m.user_id == user.as_uuid())
            .ok_or(StoreError::NotFound("membership"))?;

        if target.is_owner() {
            let other_owners = members
                .iter()
                .filter(|m| m.user_id != user.as_uuid() && m.is_owner())
                .count();
            if other_owners == 0 {
                return Err(StoreError::LastOwner);
            }
        }

        sqlx::query("DELETE FROM memberships WHERE id = $1")
            .bind(target.id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }
}

#[async_trait]
impl InvitationStore for PgBackend {
    async fn insert(&self, invitation: &Invitation) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO invitations \
             (id, organization_id, email, role_id, token, expires_at, invited_by, status, accepted_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(invitation.id.as_uuid())
        .bind(invitation.org.as_uuid())
        .bind(&invitation.email)
        .bind(invitation.role.as_uuid())
        .bind(&invitation.token)
        .bind(invitation.expires_at)
        .bind(invitation.invited_by.as_uuid())
        .bind(invitation.status.as_str())
        .bind(invitation.accepted_at)
        .bind(invitation.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn by_token(&self, token: &str) -> StoreResult<Option<Invitation>> {
        let row = sqlx::query_as::<_, InvitationRow>(&format!(
            "SELECT {INVITATION_COLS} FROM invitations WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx)?;
        row.map(TryInto::try_into).transpose()
    }

    async fn has_pending(&self, org: OrgId, email: &str) -> StoreResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM invitations \
             WHERE organization_id = $1 AND email = $2 AND status = 'pending'",
        )
        .bind(org.as_uuid())
        .bind(email)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(count > 0)
    }

    async fn accept(
        &self,
        id: InvitationId,
        accepted_at: DateTime<Utc>,
        new_user: Option<&User>,
        membership: &Membership,
    ) -> StoreResult<()> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx)?;
        // Consuming the token and materializing the membership must land
        // together; the conditional UPDATE doubles as the single-use check.
        let consumed = sqlx::query_scalar::<_, Uuid>(
            "UPDATE invitations SET status = 'accepted', accepted_at = $2 \
             WHERE id = $1 AND status = 'pending' RETURNING id",
        )
        .bind(id.as_uuid())
        .bind(accepted_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        if consumed.is_none() {
            return Err(StoreError::NotFound("invitation"));
        }
        if let Some(user) = new_user {
            insert_user(&mut *tx, user).await?;
        }
        insert_membership(&mut *tx, membership).await?;
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }
}
