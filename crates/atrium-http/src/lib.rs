// SPDX-License-Identifier: Apache-2.0
//! HTTP surface of the Atrium backend.
//!
//! Thin edge over the service layer: extract and verify the bearer token,
//! enforce the tenant header, check the operation's permission key against
//! the claims, translate service errors into the response envelope. No
//! business rules live here.

pub mod dto;
pub mod envelope;
pub mod error;
pub mod extract;
mod handlers;
pub mod state;

use axum::routing::{delete, get, post, put};
use axum::Router;

pub use error::ApiError;
pub use state::AppState;

/// Builds the `/api/v1` router. Middleware layers (trace, CORS, timeout)
/// are the daemon's concern.
#[must_use]
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Public.
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/invite/accept", post(handlers::auth::accept_invite))
        .route("/venues/{venue}/manifest", get(handlers::venues::manifest))
        // Venues & areas.
        .route(
            "/venues",
            post(handlers::venues::create).get(handlers::venues::list),
        )
        .route("/venues/{venue}/areas", get(handlers::venues::areas))
        .route("/areas", post(handlers::venues::create_area))
        // Graph editor.
        .route("/editor/{venue_id}", get(handlers::editor::editor_view))
        .route(
            "/editor/{venue_id}/revisions",
            get(handlers::editor::revisions),
        )
        .route("/editor/{venue_id}/publish", post(handlers::editor::publish))
        .route("/editor/floors", post(handlers::editor::create_floor))
        .route(
            "/editor/floors/{id}/map",
            put(handlers::editor::update_floor_map),
        )
        .route("/editor/nodes", post(handlers::editor::create_node))
        .route(
            "/editor/nodes/{id}/position",
            put(handlers::editor::update_position),
        )
        .route(
            "/editor/nodes/{id}/calibration",
            put(handlers::editor::update_calibration),
        )
        .route("/editor/nodes/{id}", delete(handlers::editor::delete_node))
        .route(
            "/editor/connections",
            post(handlers::editor::connect).delete(handlers::editor::disconnect),
        )
        // Organization & team.
        .route(
            "/orgs/{org_id}/members",
            get(handlers::org::members).patch(handlers::org::update_role),
        )
        .route("/orgs/{org_id}/invite", post(handlers::org::invite))
        .route(
            "/orgs/{org_id}/members/{user_id}",
            delete(handlers::org::remove_member),
        )
        // Roles & permissions.
        .route(
            "/roles",
            get(handlers::org::list_roles).post(handlers::org::create_role),
        )
        .route("/permissions", get(handlers::org::permissions))
        // Media.
        .route("/media/upload-init", post(handlers::media::upload_init))
        .route("/media/confirm", post(handlers::media::confirm))
        // Audit trail.
        .route("/audit-logs", get(handlers::audit::page));

    Router::new().nest("/api/v1", api).with_state(state)
}
