// SPDX-License-Identifier: Apache-2.0
//! Graph editor endpoints. Every mutation requires `graph:edit`; publish
//! requires `graph:publish`.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;

use atrium_core::rbac::PermissionKey;
use atrium_core::{FloorId, NodeId, VenueId};
use atrium_service::editor::{NewFloor, NewNode};

use crate::dto::{
    CalibrationRequest, ConnectRequest, CreateFloorRequest, CreateNodeRequest, DisconnectQuery,
    EdgeResponse, FloorQuery, FloorResponse, NodeResponse, PublishRequest, PublishResponse,
    RevisionSummary, UpdateFloorMapRequest, UpdatePositionRequest,
};
use crate::envelope;
use crate::error::ApiError;
use crate::extract::Authenticated;
use crate::state::AppState;

/// `GET /editor/{venue_id}` — the draft projection for the authoring UI.
pub async fn editor_view(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(venue): Path<VenueId>,
) -> Result<Response, ApiError> {
    let doc = state.projections.editor_view(auth.actor(), venue).await?;
    Ok(envelope::ok(doc))
}

/// `GET /editor/{venue_id}/revisions`
pub async fn revisions(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(venue): Path<VenueId>,
) -> Result<Response, ApiError> {
    let history = state.editor.history(auth.actor(), venue).await?;
    let history: Vec<RevisionSummary> = history.into_iter().map(Into::into).collect();
    Ok(envelope::ok(history))
}

/// `POST /editor/floors?venue_id=…`
pub async fn create_floor(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<FloorQuery>,
    Json(body): Json<CreateFloorRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::GraphEdit)?;
    let floor = state
        .editor
        .create_floor(
            auth.actor(),
            query.venue_id,
            NewFloor {
                name: body.name,
                level_index: body.level_index,
                map_image: body.map_image_id,
                map_width: body.width,
                map_height: body.height,
                pixels_per_meter: body.pixels_per_meter,
            },
        )
        .await?;
    Ok(envelope::created(FloorResponse::from(floor)))
}

/// `PUT /editor/floors/{id}/map`
pub async fn update_floor_map(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(floor): Path<FloorId>,
    Json(body): Json<UpdateFloorMapRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::GraphEdit)?;
    state
        .editor
        .update_floor_map(
            auth.actor(),
            floor,
            body.map_image_id,
            body.width,
            body.height,
            body.pixels_per_meter,
        )
        .await?;
    Ok(envelope::ok_empty())
}

/// `POST /editor/nodes`
pub async fn create_node(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<CreateNodeRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::GraphEdit)?;
    let node = state
        .editor
        .create_node(
            auth.actor(),
            NewNode {
                floor: body.floor_id,
                x: body.x,
                y: body.y,
                panorama_asset: body.panorama_asset_id,
                label: body.label,
            },
        )
        .await?;
    Ok(envelope::created(NodeResponse::from(node)))
}

/// `PUT /editor/nodes/{id}/position`
pub async fn update_position(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(node): Path<NodeId>,
    Json(body): Json<UpdatePositionRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::GraphEdit)?;
    state
        .editor
        .update_node_position(auth.actor(), node, body.x, body.y)
        .await?;
    Ok(envelope::ok_empty())
}

/// `PUT /editor/nodes/{id}/calibration`
pub async fn update_calibration(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(node): Path<NodeId>,
    Json(body): Json<CalibrationRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::GraphEdit)?;
    state
        .editor
        .update_node_calibration(auth.actor(), node, body.rotation_offset)
        .await?;
    Ok(envelope::ok_empty())
}

/// `DELETE /editor/nodes/{id}`
pub async fn delete_node(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(node): Path<NodeId>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::GraphEdit)?;
    state.editor.delete_node(auth.actor(), node).await?;
    Ok(envelope::ok_empty())
}

/// `POST /editor/connections`
pub async fn connect(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<ConnectRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::GraphEdit)?;
    let edge = state
        .editor
        .connect_nodes(auth.actor(), body.from_node_id, body.to_node_id, body.kind)
        .await?;
    Ok(envelope::created(EdgeResponse::from(edge)))
}

/// `DELETE /editor/connections?from=…&to=…`
pub async fn disconnect(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<DisconnectQuery>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::GraphEdit)?;
    state
        .editor
        .delete_edge(auth.actor(), query.from, query.to)
        .await?;
    Ok(envelope::ok_empty())
}

/// `POST /editor/{venue_id}/publish` — requires `graph:publish`.
pub async fn publish(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(venue): Path<VenueId>,
    Json(body): Json<PublishRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::GraphPublish)?;
    let revision_id = state
        .publisher
        .publish(auth.actor(), venue, &body.note)
        .await?;
    Ok(envelope::ok(PublishResponse { revision_id }))
}
