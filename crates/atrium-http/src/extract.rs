// SPDX-License-Identifier: Apache-2.0
//! Request guards.
//!
//! The three access checks compose in order on every protected route:
//! authenticate (bearer signature + expiry), tenant guard (`X-Tenant-ID`
//! must match the token's active org when present), and per-operation
//! permission checks done in handlers via [`AccessClaims::require`].
//! Claims are authoritative for the request's lifetime.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use atrium_auth::claims::AccessClaims;
use atrium_auth::token::TokenError;
use atrium_core::{Error, OrgId};
use atrium_service::Actor;

use crate::error::ApiError;
use crate::state::AppState;

/// Tenant header name.
pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// Verified claims of the calling user.
#[derive(Debug, Clone)]
pub struct Authenticated(pub AccessClaims);

impl Authenticated {
    /// The caller as a service-layer actor.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor {
            user: self.0.user,
            org: self.0.org,
        }
    }
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(Error::Unauthorized("missing bearer token"))?;

        let claims = state.tokens.verify(bearer).map_err(|err| match err {
            TokenError::Expired => Error::Unauthorized("token expired"),
            TokenError::Invalid => Error::Unauthorized("token invalid"),
        })?;

        // Tenant guard: an unparseable tenant header can never match the
        // token's organization, so it fails the same way a foreign one
        // does.
        if let Some(raw) = parts.headers.get(TENANT_HEADER) {
            let requested = raw
                .to_str()
                .ok()
                .and_then(|value| Uuid::parse_str(value.trim()).ok())
                .map(OrgId::from_uuid)
                .ok_or(Error::TenantMismatch)?;
            claims.require_tenant(Some(requested))?;
        }

        Ok(Self(claims))
    }
}
