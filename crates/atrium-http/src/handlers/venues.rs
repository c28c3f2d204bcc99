// SPDX-License-Identifier: Apache-2.0
//! Venue, area, and public manifest endpoints.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use atrium_core::rbac::PermissionKey;

use crate::dto::{AreaResponse, CreateAreaRequest, CreateVenueRequest, PageParams, VenueResponse};
use crate::envelope;
use crate::error::ApiError;
use crate::extract::Authenticated;
use crate::state::AppState;

/// `GET /venues/{venue}/manifest` — public, served raw (no envelope) so
/// mobile clients parse the document directly.
pub async fn manifest(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let doc = state.projections.manifest(&slug).await?;
    Ok(Json(doc).into_response())
}

/// `POST /venues` — requires `venue:create`.
pub async fn create(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<CreateVenueRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::VenueCreate)?;
    let venue = state
        .venues
        .create(auth.actor(), &body.name, &body.description)
        .await?;
    Ok(envelope::created(VenueResponse::from(venue)))
}

/// `GET /venues`
pub async fn list(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(page): Query<PageParams>,
) -> Result<Response, ApiError> {
    let venues = state
        .venues
        .list(auth.actor(), page.limit, page.offset)
        .await?;
    let venues: Vec<VenueResponse> = venues.into_iter().map(Into::into).collect();
    Ok(envelope::ok(venues))
}

/// `POST /areas` — requires `venue:update`.
pub async fn create_area(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<CreateAreaRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::VenueUpdate)?;
    let area = state
        .venues
        .create_area(auth.actor(), body.venue_id, &body.name, &body.category)
        .await?;
    Ok(envelope::created(AreaResponse::from(area)))
}

/// `GET /venues/{venue}/areas`
pub async fn areas(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(venue): Path<atrium_core::VenueId>,
) -> Result<Response, ApiError> {
    let areas = state.venues.areas(auth.actor(), venue).await?;
    let areas: Vec<AreaResponse> = areas.into_iter().map(Into::into).collect();
    Ok(envelope::ok(areas))
}
