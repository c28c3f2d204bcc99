// SPDX-License-Identifier: Apache-2.0
//! Domain model for the Atrium indoor-mapping backend.
//!
//! Everything in this crate is pure data and pure functions: typed
//! identifiers, tenant/identity entities, the venue graph-revision model,
//! edge geometry, and the service-level error taxonomy. Persistence and
//! transport live in sibling crates.

pub mod audit;
pub mod error;
pub mod geometry;
pub mod id;
pub mod media;
pub mod org;
pub mod rbac;
pub mod revision;
pub mod user;
pub mod venue;

pub use error::Error;
pub use id::{
    AreaId, AssetId, AuditId, EdgeId, FloorId, InvitationId, MembershipId, NodeId, OrgId,
    RevisionId, RoleId, UserId, VenueId,
};

/// Crate-wide result alias over the service-level error taxonomy.
pub type Result<T> = std::result::Result<T, Error>;
