// SPDX-License-Identifier: Apache-2.0
//! Registration, login, and invitation acceptance.

use chrono::Utc;
use uuid::Uuid;

use atrium_auth::claims::AccessClaims;
use atrium_auth::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use atrium_auth::token::{random_opaque_token, TokenCodec};
use atrium_core::org::{Membership, Organization};
use atrium_core::user::User;
use atrium_core::venue::slugify;
use atrium_core::{Error, MembershipId, OrgId, Result, UserId};
use atrium_store::{InvitationStore, OrgStore, RoleStore, Stores, UserStore};

use crate::store_err;

/// Registration input.
#[derive(Debug, Clone)]
pub struct RegisterParams {
    /// Display name of the first user.
    pub full_name: String,
    /// Login email.
    pub email: String,
    /// Plaintext password (hashed here, never stored).
    pub password: String,
    /// Name of the organization to create.
    pub organization_name: String,
}

/// One organization the user belongs to, as returned on auth responses.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgSummary {
    /// Organization id.
    pub organization_id: OrgId,
    /// Organization name.
    pub name: String,
    /// Organization slug.
    pub slug: String,
    /// The user's role in this organization.
    pub role_name: String,
}

/// User profile embedded in auth responses.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User id.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Organizations the user belongs to, oldest membership first.
    pub organizations: Vec<OrgSummary>,
}

/// A freshly minted session.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    /// Signed access token.
    pub access_token: String,
    /// Opaque refresh token. Returned for wire compatibility; there is no
    /// refresh endpoint yet.
    pub refresh_token: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
    /// The authenticated user.
    pub user: UserProfile,
}

/// Registration, login, and invitation acceptance.
#[derive(Clone)]
pub struct AuthService {
    stores: Stores,
    tokens: TokenCodec,
}

impl AuthService {
    /// Builds the service over a storage bundle and token codec.
    #[must_use]
    pub fn new(stores: Stores, tokens: TokenCodec) -> Self {
        Self { stores, tokens }
    }

    /// Creates a user, a new organization, and the Owner membership, all
    /// or nothing, then mints a session scoped to the new organization.
    pub async fn register(&self, params: RegisterParams) -> Result<AuthSession> {
        let email = User::normalize_email(&params.email);
        validate_email(&email)?;
        validate_password(&params.password)?;
        if params.full_name.trim().is_empty() {
            return Err(Error::InvalidInput("full name is required".into()));
        }
        if params.organization_name.trim().is_empty() {
            return Err(Error::InvalidInput("organization name is required".into()));
        }

        let owner_role = self
            .stores
            .roles
            .system_role("Owner")
            .await
            .map_err(store_err)?
            .ok_or(Error::SystemMisconfigured)?;

        let password_hash =
            hash_password(&params.password).map_err(|_| Error::Internal("hashing failed".into()))?;
        let now = Utc::now();
        let org = Organization {
            id: OrgId::generate(),
            name: params.organization_name.trim().to_owned(),
            slug: unique_slug(params.organization_name.trim()),
            is_active: true,
            created_at: now,
        };
        let user = User {
            id: UserId::generate(),
            email,
            password_hash,
            full_name: params.full_name.trim().to_owned(),
            created_at: now,
        };
        let membership = Membership {
            id: MembershipId::generate(),
            org: org.id,
            user: user.id,
            role: owner_role.id,
            joined_at: now,
        };

        self.stores
            .orgs
            .provision(&org, &user, &membership)
            .await
            .map_err(store_err)?;

        self.issue(&user, Some(org.id)).await
    }

    /// Verifies credentials and mints a session for the user's first
    /// organization.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        const BAD_CREDENTIALS: Error = Error::Unauthorized("invalid email or password");

        let email = User::normalize_email(email);
        let user = self
            .stores
            .users
            .by_email(&email)
            .await
            .map_err(store_err)?
            .ok_or(BAD_CREDENTIALS)?;
        if !verify_password(password, &user.password_hash) {
            return Err(BAD_CREDENTIALS);
        }
        self.issue(&user, None).await
    }

    /// Consumes an invitation token: reuses the account matching the
    /// invited email, or creates one with the supplied password, then
    /// materializes the membership and mints a session for the inviting
    /// organization.
    pub async fn accept_invitation(
        &self,
        token: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthSession> {
        let invitation = self
            .stores
            .invitations
            .by_token(token)
            .await
            .map_err(store_err)?
            .ok_or(Error::InvalidInvitation)?;
        let now = Utc::now();
        if !invitation.is_usable(now) {
            return Err(Error::InvalidInvitation);
        }

        let existing = self
            .stores
            .users
            .by_email(&invitation.email)
            .await
            .map_err(store_err)?;
        let (user, new_user) = match existing {
            Some(user) => (user, None),
            None => {
                validate_password(password)?;
                if full_name.trim().is_empty() {
                    return Err(Error::InvalidInput("full name is required".into()));
                }
                let password_hash = hash_password(password)
                    .map_err(|_| Error::Internal("hashing failed".into()))?;
                let user = User {
                    id: UserId::generate(),
                    email: invitation.email.clone(),
                    password_hash,
                    full_name: full_name.trim().to_owned(),
                    created_at: now,
                };
                (user.clone(), Some(user))
            }
        };

        let membership = Membership {
            id: MembershipId::generate(),
            org: invitation.org,
            user: user.id,
            role: invitation.role,
            joined_at: now,
        };
        self.stores
            .invitations
            .accept(invitation.id, now, new_user.as_ref(), &membership)
            .await
            .map_err(|err| match err {
                // Raced with another acceptance of the same token.
                atrium_store::StoreError::NotFound("invitation") => Error::InvalidInvitation,
                other => store_err(other),
            })?;

        self.issue(&user, Some(invitation.org)).await
    }

    /// Mints a session for `user`, preferring `active_org` when the user
    /// belongs to it. Permissions are resolved here, once, and embedded in
    /// the claims; nothing on the request hot path re-reads them.
    pub async fn issue(&self, user: &User, active_org: Option<OrgId>) -> Result<AuthSession> {
        let memberships = self
            .stores
            .users
            .memberships_of(user.id)
            .await
            .map_err(store_err)?;
        let active = active_org
            .and_then(|org| memberships.iter().find(|m| m.membership.org == org))
            .or_else(|| memberships.first())
            .ok_or(Error::Unauthorized("no organization membership"))?;

        let (iat, exp) = TokenCodec::lifetime(Utc::now());
        let claims = AccessClaims {
            user: user.id,
            email: user.email.clone(),
            org: active.membership.org,
            role: active.role_name.clone(),
            perms: active.permissions.clone(),
            iat,
            exp,
        };
        let access_token = self
            .tokens
            .mint(&claims)
            .map_err(|_| Error::Internal("token minting failed".into()))?;

        let organizations = memberships
            .iter()
            .map(|m| OrgSummary {
                organization_id: m.membership.org,
                name: m.org_name.clone(),
                slug: m.org_slug.clone(),
                role_name: m.role_name.clone(),
            })
            .collect();

        Ok(AuthSession {
            access_token,
            refresh_token: random_opaque_token(),
            expires_in: exp - iat,
            user: UserProfile {
                id: user.id,
                email: user.email.clone(),
                full_name: user.full_name.clone(),
                organizations,
            },
        })
    }
}

fn validate_email(email: &str) -> Result<()> {
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if well_formed {
        Ok(())
    } else {
        Err(Error::InvalidInput("email is malformed".into()))
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// `slugify(name)` plus a short random suffix for uniqueness.
fn unique_slug(name: &str) -> String {
    let base = slugify(name);
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    if base.is_empty() {
        suffix.to_owned()
    } else {
        format!("{base}-{suffix}")
    }
}
