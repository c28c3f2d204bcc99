// SPDX-License-Identifier: Apache-2.0
//! Team and role endpoints.
//!
//! Authorization is claims-driven: the `{org_id}` path segment is
//! cosmetic and never used for scoping — data access always follows the
//! token's active organization, and an explicit `X-Tenant-ID` header is
//! enforced upstream by the extractor.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;

use atrium_core::rbac::PermissionKey;
use atrium_core::{Error, OrgId, UserId};

use crate::dto::{
    CreateRoleRequest, InviteRequest, MemberResponse, RoleResponse, UpdateMemberRoleRequest,
};
use crate::envelope;
use crate::error::ApiError;
use crate::extract::Authenticated;
use crate::state::AppState;

/// `GET /orgs/{org_id}/members`
pub async fn members(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(_org): Path<OrgId>,
) -> Result<Response, ApiError> {
    let members = state.team.members(auth.actor()).await?;
    let members: Vec<MemberResponse> = members.into_iter().map(Into::into).collect();
    Ok(envelope::ok(members))
}

/// `POST /orgs/{org_id}/invite` — requires `team:invite`.
pub async fn invite(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(_org): Path<OrgId>,
    Json(body): Json<InviteRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::TeamInvite)?;
    let invitation = state
        .team
        .invite(auth.actor(), &body.email, body.role_id)
        .await?;
    Ok(envelope::created(invitation))
}

/// `PATCH /orgs/{org_id}/members` — requires `team:manage`.
pub async fn update_role(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(_org): Path<OrgId>,
    Json(body): Json<UpdateMemberRoleRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::TeamManage)?;
    state
        .team
        .update_member_role(auth.actor(), body.user_id, body.role_id)
        .await?;
    Ok(envelope::ok_empty())
}

/// `DELETE /orgs/{org_id}/members/{user_id}` — requires `team:manage`.
pub async fn remove_member(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((_org, user)): Path<(OrgId, UserId)>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::TeamManage)?;
    state.team.remove_member(auth.actor(), user).await?;
    Ok(envelope::ok_empty())
}

/// `GET /roles` — system roles plus the caller-org's custom roles.
pub async fn list_roles(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Response, ApiError> {
    let roles = state.roles.list_roles(auth.actor()).await?;
    let roles: Vec<RoleResponse> = roles.into_iter().map(Into::into).collect();
    Ok(envelope::ok(roles))
}

/// `POST /roles` — requires `org:settings`.
pub async fn create_role(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<CreateRoleRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::OrgSettings)?;
    let permissions = body
        .permissions
        .iter()
        .map(|key| {
            key.parse::<PermissionKey>()
                .map_err(|err| Error::InvalidInput(err.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let role = state
        .roles
        .create_custom_role(auth.actor(), &body.name, &body.description, permissions)
        .await?;
    Ok(envelope::created(RoleResponse::from(role)))
}

/// `GET /permissions` — the grouped catalog.
pub async fn permissions(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Response, ApiError> {
    Ok(envelope::ok(state.roles.permission_catalog()))
}
