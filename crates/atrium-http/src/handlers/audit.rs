// SPDX-License-Identifier: Apache-2.0
//! Audit-trail endpoints.

use axum::extract::{Query, State};
use axum::response::Response;

use atrium_core::rbac::PermissionKey;

use crate::dto::{AuditEntryResponse, AuditPageResponse, AuditParams};
use crate::envelope;
use crate::error::ApiError;
use crate::extract::Authenticated;
use crate::state::AppState;

/// `GET /audit-logs?cursor=&limit=&action=&user_id=` — requires
/// `org:settings`.
pub async fn page(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(params): Query<AuditParams>,
) -> Result<Response, ApiError> {
    auth.0.require(PermissionKey::OrgSettings)?;
    let page = state
        .audit
        .page(
            auth.actor(),
            params.cursor.as_deref(),
            params.limit,
            params.action,
            params.user_id,
        )
        .await?;
    Ok(envelope::ok(AuditPageResponse {
        entries: page.entries.into_iter().map(AuditEntryResponse::from).collect(),
        next_cursor: page.next_cursor,
    }))
}
