// SPDX-License-Identifier: Apache-2.0
//! Storage contracts for the Atrium backend.
//!
//! One small capability trait per entity class, composed into a [`Stores`]
//! bundle that services receive at construction. Implementations live in
//! sibling crates (`atrium-store-pg`, `atrium-store-mem`); this crate also
//! holds the pure half of the publish protocol — [`plan::PublishPlan`] —
//! so the deep-copy's id translation and integrity checks are testable
//! without a database.

pub mod audit;
pub mod content;
pub mod cursor;
pub mod error;
pub mod graph;
pub mod identity;
pub mod plan;
pub mod tree;

use std::sync::Arc;

pub use audit::{AuditPage, AuditQuery, AuditStore};
pub use content::{AreaStore, MediaStore, VenueStore};
pub use error::{Constraint, StoreError};
pub use graph::{GraphWriteStore, RevisionStore};
pub use identity::{
    InvitationStore, MemberDetail, MembershipDetail, MembershipStore, OrgStore, RoleStore,
    UserStore,
};
pub use plan::PublishPlan;
pub use tree::{FloorTree, NodeTree, RevisionTree};

/// Result alias over [`StoreError`].
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The full set of storage capabilities a backend provides.
///
/// Cloning is cheap (all members are `Arc`s); each service keeps its own
/// copy of the bundle.
#[derive(Clone)]
pub struct Stores {
    /// Users.
    pub users: Arc<dyn UserStore>,
    /// Organizations.
    pub orgs: Arc<dyn OrgStore>,
    /// Roles and the permission catalog.
    pub roles: Arc<dyn RoleStore>,
    /// Memberships.
    pub memberships: Arc<dyn MembershipStore>,
    /// Invitations.
    pub invitations: Arc<dyn InvitationStore>,
    /// Venues.
    pub venues: Arc<dyn VenueStore>,
    /// Areas.
    pub areas: Arc<dyn AreaStore>,
    /// Media assets.
    pub media: Arc<dyn MediaStore>,
    /// Revisions (draft/live/history/publish).
    pub revisions: Arc<dyn RevisionStore>,
    /// Draft graph writes (floors, nodes, edges).
    pub graph: Arc<dyn GraphWriteStore>,
    /// Audit trail.
    pub audit: Arc<dyn AuditStore>,
}
