// SPDX-License-Identifier: Apache-2.0
//! Shared application state.

use std::sync::Arc;

use atrium_auth::token::TokenCodec;
use atrium_blob::BlobStore;
use atrium_service::audit::AuditRecorder;
use atrium_service::media::MediaConfig;
use atrium_service::{
    AuditService, AuthService, EditorService, ManifestService, MediaService, PublishService,
    RoleService, TeamService, VenueService,
};
use atrium_store::Stores;

/// Everything handlers need, cloned per request (all members are cheap
/// clones over `Arc`s).
#[derive(Clone)]
pub struct AppState {
    /// Token verification for the claims extractor.
    pub tokens: TokenCodec,
    /// Registration, login, invitation acceptance.
    pub auth: AuthService,
    /// Membership management.
    pub team: TeamService,
    /// Roles and the permission catalog.
    pub roles: RoleService,
    /// Venues and areas.
    pub venues: VenueService,
    /// Draft graph editing.
    pub editor: EditorService,
    /// Draft → live publishing.
    pub publisher: PublishService,
    /// Manifest and editor projections.
    pub projections: ManifestService,
    /// Upload protocol.
    pub media: MediaService,
    /// Audit reads.
    pub audit: AuditService,
}

impl AppState {
    /// Wires every service over one storage bundle.
    #[must_use]
    pub fn new(
        stores: Stores,
        tokens: TokenCodec,
        blob: Arc<dyn BlobStore>,
        media_config: MediaConfig,
        recorder: AuditRecorder,
    ) -> Self {
        Self {
            tokens: tokens.clone(),
            auth: AuthService::new(stores.clone(), tokens),
            team: TeamService::new(stores.clone(), recorder.clone()),
            roles: RoleService::new(stores.clone()),
            venues: VenueService::new(stores.clone(), recorder.clone()),
            editor: EditorService::new(stores.clone(), recorder.clone()),
            publisher: PublishService::new(stores.clone(), recorder.clone()),
            projections: ManifestService::new(stores.clone()),
            media: MediaService::new(stores.clone(), blob, media_config, recorder),
            audit: AuditService::new(stores),
        }
    }
}
