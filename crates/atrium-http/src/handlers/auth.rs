// SPDX-License-Identifier: Apache-2.0
//! Public authentication endpoints.

use axum::extract::State;
use axum::response::Response;
use axum::Json;

use atrium_service::identity::RegisterParams;

use crate::dto::{AcceptInviteRequest, LoginRequest, RegisterRequest};
use crate::envelope;
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let session = state
        .auth
        .register(RegisterParams {
            full_name: body.full_name,
            email: body.email,
            password: body.password,
            organization_name: body.organization_name,
        })
        .await?;
    Ok(envelope::created(session))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let session = state.auth.login(&body.email, &body.password).await?;
    Ok(envelope::ok(session))
}

/// `POST /auth/invite/accept`
pub async fn accept_invite(
    State(state): State<AppState>,
    Json(body): Json<AcceptInviteRequest>,
) -> Result<Response, ApiError> {
    let session = state
        .auth
        .accept_invitation(&body.token, &body.password, &body.full_name)
        .await?;
    Ok(envelope::ok(session))
}
