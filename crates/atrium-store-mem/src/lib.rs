// SPDX-License-Identifier: Apache-2.0
//! In-memory implementation of the Atrium storage contracts.
//!
//! Plain `BTreeMap` tables behind one mutex. Used by service and HTTP
//! tests and by `atriumd --memory`; the multi-row operations take the same
//! all-checks-before-any-write shape the SQL backend gets from
//! transactions, so atomicity guarantees hold here too.

mod audit;
mod content;
mod graph;
mod identity;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use atrium_core::audit::AuditEntry;
use atrium_core::media::MediaAsset;
use atrium_core::org::{Invitation, Membership, Organization};
use atrium_core::rbac::Role;
use atrium_core::revision::{Edge, Floor, Node, Revision};
use atrium_core::user::User;
use atrium_core::venue::{Area, Venue};
use atrium_core::{
    AreaId, AssetId, EdgeId, FloorId, InvitationId, MembershipId, NodeId, OrgId, RevisionId,
    RoleId, UserId, VenueId,
};
use atrium_store::Stores;

/// All tables of the in-memory backend.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) users: BTreeMap<UserId, User>,
    pub(crate) orgs: BTreeMap<OrgId, Organization>,
    pub(crate) roles: BTreeMap<RoleId, Role>,
    pub(crate) memberships: BTreeMap<MembershipId, Membership>,
    pub(crate) invitations: BTreeMap<InvitationId, Invitation>,
    pub(crate) venues: BTreeMap<VenueId, Venue>,
    pub(crate) areas: BTreeMap<AreaId, Area>,
    pub(crate) media: BTreeMap<AssetId, MediaAsset>,
    pub(crate) revisions: BTreeMap<RevisionId, Revision>,
    pub(crate) floors: BTreeMap<FloorId, Floor>,
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) edges: BTreeMap<EdgeId, Edge>,
    pub(crate) audit: Vec<AuditEntry>,
}

/// Shared-state in-memory backend implementing every store trait.
#[derive(Debug, Clone, Default)]
pub struct MemBackend {
    inner: Arc<Mutex<Tables>>,
}

impl MemBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundles this backend into the [`Stores`] aggregate.
    #[must_use]
    pub fn stores(&self) -> Stores {
        Stores {
            users: Arc::new(self.clone()),
            orgs: Arc::new(self.clone()),
            roles: Arc::new(self.clone()),
            memberships: Arc::new(self.clone()),
            invitations: Arc::new(self.clone()),
            venues: Arc::new(self.clone()),
            areas: Arc::new(self.clone()),
            media: Arc::new(self.clone()),
            revisions: Arc::new(self.clone()),
            graph: Arc::new(self.clone()),
            audit: Arc::new(self.clone()),
        }
    }

    /// Locks the table set. A poisoned lock is recovered rather than
    /// propagated; tables stay consistent because writers mutate only
    /// after completing every check.
    pub(crate) fn tables(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
