// SPDX-License-Identifier: Apache-2.0
//! Media upload endpoints.

use axum::extract::State;
use axum::response::Response;
use axum::Json;

use atrium_core::rbac::PermissionKey;
use atrium_service::media::UploadInit;

use crate::dto::{ConfirmUploadRequest, UploadInitRequest};
use crate::envelope;
use crate::error::ApiError;
use crate::extract::Authenticated;
use crate::state::AppState;

/// `POST /media/upload-init` — requires `media:upload`.
pub async fn upload_init(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<UploadInitRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::MediaUpload)?;
    let target = state
        .media
        .init_upload(
            auth.actor(),
            UploadInit {
                file_name: body.file_name,
                file_type: body.file_type,
                category: body.category,
                file_size: body.file_size,
            },
        )
        .await?;
    Ok(envelope::created(target))
}

/// `POST /media/confirm`
pub async fn confirm(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<ConfirmUploadRequest>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::MediaUpload)?;
    state
        .media
        .confirm_upload(auth.actor(), body.asset_id, body.width, body.height)
        .await?;
    Ok(envelope::ok_empty())
}
