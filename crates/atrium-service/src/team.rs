// SPDX-License-Identifier: Apache-2.0
//! Membership management: invitations, role changes, removal.

use chrono::{Duration, Utc};

use atrium_auth::token::random_opaque_token;
use atrium_core::org::{Invitation, InvitationStatus};
use atrium_core::user::User;
use atrium_core::{Error, InvitationId, Result, RoleId, UserId};
use atrium_store::{InvitationStore, MemberDetail, MembershipStore, RoleStore, Stores, UserStore};

use crate::audit::AuditRecorder;
use crate::{store_err, Actor};

/// Invitation lifetime.
const INVITATION_TTL_DAYS: i64 = 7;

/// Summary returned when an invitation is created. The token is handed to
/// the caller for delivery; the backend does not send email itself.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationSummary {
    /// Invitation id.
    pub id: InvitationId,
    /// Invited email.
    pub email: String,
    /// Role granted on acceptance.
    pub role_id: RoleId,
    /// Single-use token.
    pub token: String,
    /// Expiry timestamp (RFC 3339).
    pub expires_at: chrono::DateTime<Utc>,
}

/// Membership management scoped to the caller's organization.
#[derive(Clone)]
pub struct TeamService {
    stores: Stores,
    audit: AuditRecorder,
}

impl TeamService {
    /// Builds the service over a storage bundle.
    #[must_use]
    pub fn new(stores: Stores, audit: AuditRecorder) -> Self {
        Self { stores, audit }
    }

    /// Creates a pending invitation for `email` with `role`.
    pub async fn invite(&self, actor: Actor, email: &str, role: RoleId) -> Result<InvitationSummary> {
        let email = User::normalize_email(email);
        if !email.contains('@') {
            return Err(Error::InvalidInput("email is malformed".into()));
        }
        let role_row = self
            .stores
            .roles
            .by_id(role)
            .await
            .map_err(store_err)?
            .ok_or(Error::NotFound("role"))?;
        // Custom roles from another tenant are invisible here.
        if let Some(owner) = role_row.org {
            if owner != actor.org {
                return Err(Error::NotFound("role"));
            }
        }

        if let Some(user) = self.stores.users.by_email(&email).await.map_err(store_err)? {
            let already = self
                .stores
                .memberships
                .get(actor.org, user.id)
                .await
                .map_err(store_err)?;
            if already.is_some() {
                return Err(Error::AlreadyMember);
            }
        }
        if self
            .stores
            .invitations
            .has_pending(actor.org, &email)
            .await
            .map_err(store_err)?
        {
            return Err(Error::InvitationPending);
        }

        let now = Utc::now();
        let invitation = Invitation {
            id: InvitationId::generate(),
            org: actor.org,
            email: email.clone(),
            role,
            token: random_opaque_token(),
            expires_at: now + Duration::days(INVITATION_TTL_DAYS),
            invited_by: actor.user,
            status: InvitationStatus::Pending,
            accepted_at: None,
            created_at: now,
        };
        self.stores
            .invitations
            .insert(&invitation)
            .await
            .map_err(store_err)?;

        self.audit.record(
            actor.org,
            Some(actor.user),
            "member.invite",
            "invitation",
            &invitation.id.to_string(),
            serde_json::json!({ "email": email }),
        );

        Ok(InvitationSummary {
            id: invitation.id,
            email: invitation.email,
            role_id: invitation.role,
            token: invitation.token,
            expires_at: invitation.expires_at,
        })
    }

    /// Lists members of the caller's organization.
    pub async fn members(&self, actor: Actor) -> Result<Vec<MemberDetail>> {
        self.stores
            .memberships
            .members_of(actor.org)
            .await
            .map_err(store_err)
    }

    /// Changes a member's role. Fails `OwnerRequired` when the change
    /// would leave the organization without an owner.
    pub async fn update_member_role(
        &self,
        actor: Actor,
        target: UserId,
        new_role: RoleId,
    ) -> Result<()> {
        let role_row = self
            .stores
            .roles
            .by_id(new_role)
            .await
            .map_err(store_err)?
            .ok_or(Error::NotFound("role"))?;
        if let Some(owner) = role_row.org {
            if owner != actor.org {
                return Err(Error::NotFound("role"));
            }
        }
        self.stores
            .memberships
            .update_role(actor.org, target, new_role)
            .await
            .map_err(store_err)?;
        self.audit.record(
            actor.org,
            Some(actor.user),
            "member.update_role",
            "membership",
            &target.to_string(),
            serde_json::json!({ "roleId": new_role }),
        );
        Ok(())
    }

    /// Removes a member. Fails `OwnerRequired` for the last owner.
    pub async fn remove_member(&self, actor: Actor, target: UserId) -> Result<()> {
        self.stores
            .memberships
            .remove(actor.org, target)
            .await
            .map_err(store_err)?;
        self.audit.record(
            actor.org,
            Some(actor.user),
            "member.remove",
            "membership",
            &target.to_string(),
            serde_json::Value::Null,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use atrium_auth::token::TokenCodec;
    use atrium_store_mem::MemBackend;

    use crate::identity::{AuthService, RegisterParams};
    use crate::rbac::bootstrap_system_roles;

    use super::*;

    async fn setup() -> (TeamService, AuthService, Actor, Stores) {
        let stores = MemBackend::new().stores();
        bootstrap_system_roles(&stores).await.unwrap();
        let auth = AuthService::new(stores.clone(), TokenCodec::new(b"s"));
        let session = auth
            .register(RegisterParams {
                full_name: "Owner".into(),
                email: "owner@x.io".into(),
                password: "pw12345678".into(),
                organization_name: "Org".into(),
            })
            .await
            .unwrap();
        let actor = Actor {
            user: session.user.id,
            org: session.user.organizations[0].organization_id,
        };
        let (recorder, _worker) = crate::audit::AuditTrail::spawn(stores.audit.clone(), 64);
        (TeamService::new(stores.clone(), recorder), auth, actor, stores)
    }

    #[tokio::test]
    async fn invite_accept_materializes_membership() {
        let (team, auth, actor, stores) = setup().await;
        let editor = stores.roles.system_role("Editor").await.unwrap().unwrap();

        let invitation = team.invite(actor, "new@x.io", editor.id).await.unwrap();
        let session = auth
            .accept_invitation(&invitation.token, "pw12345678", "New Person")
            .await
            .unwrap();
        assert_eq!(session.user.organizations[0].role_name, "Editor");

        let members = team.members(actor).await.unwrap();
        assert_eq!(members.len(), 2);

        // Single-use: a second acceptance fails.
        let err = auth
            .accept_invitation(&invitation.token, "pw12345678", "Again")
            .await
            .unwrap_err();
        assert_eq!(err, Error::InvalidInvitation);
    }

    #[tokio::test]
    async fn duplicate_pending_invitation_is_rejected() {
        let (team, _auth, actor, stores) = setup().await;
        let editor = stores.roles.system_role("Editor").await.unwrap().unwrap();
        team.invite(actor, "new@x.io", editor.id).await.unwrap();
        let err = team.invite(actor, "new@x.io", editor.id).await.unwrap_err();
        assert_eq!(err, Error::InvitationPending);
    }

    #[tokio::test]
    async fn inviting_an_existing_member_is_rejected() {
        let (team, _auth, actor, stores) = setup().await;
        let editor = stores.roles.system_role("Editor").await.unwrap().unwrap();
        let err = team.invite(actor, "owner@x.io", editor.id).await.unwrap_err();
        assert_eq!(err, Error::AlreadyMember);
    }

    #[tokio::test]
    async fn owner_invariant_blocks_sole_owner_mutations() {
        let (team, _auth, actor, stores) = setup().await;
        let viewer = stores.roles.system_role("Viewer").await.unwrap().unwrap();

        let err = team.remove_member(actor, actor.user).await.unwrap_err();
        assert_eq!(err, Error::OwnerRequired);
        let err = team
            .update_member_role(actor, actor.user, viewer.id)
            .await
            .unwrap_err();
        assert_eq!(err, Error::OwnerRequired);
    }
}
