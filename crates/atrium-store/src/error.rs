// SPDX-License-Identifier: Apache-2.0
//! Raw storage error taxonomy.
//!
//! Backends surface these untranslated; services map them into the
//! service-level taxonomy (`atrium_core::Error`). Keeping the two apart
//! stops SQL details from leaking into HTTP responses.

use std::fmt;

/// A named uniqueness (or equivalent) constraint a write can violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Users: email unique across the system.
    UserEmail,
    /// Organizations: slug unique across the system.
    OrgSlug,
    /// Venues: slug unique across the system.
    VenueSlug,
    /// Memberships: (organization, user) unique.
    Membership,
    /// Floors: level index unique within a revision.
    FloorLevel,
    /// Invitations: token unique.
    InvitationToken,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UserEmail => "user email",
            Self::OrgSlug => "organization slug",
            Self::VenueSlug => "venue slug",
            Self::Membership => "membership",
            Self::FloorLevel => "floor level index",
            Self::InvitationToken => "invitation token",
        };
        f.write_str(name)
    }
}

/// Everything a storage backend can fail with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness constraint rejected the write.
    #[error("duplicate {0}")]
    Duplicate(Constraint),

    /// Guarded membership mutation would leave the org ownerless.
    #[error("organization would be left without an owner")]
    LastOwner,

    /// `create_draft` while the venue already has one.
    #[error("venue already has a draft revision")]
    DraftExists,

    /// `publish_draft` while the venue has none.
    #[error("venue has no draft revision")]
    NoDraft,

    /// Deep-copy hit an edge whose endpoint is outside the revision.
    #[error("edge references a node outside the revision")]
    DanglingEdge,

    /// Transaction conflict (serialization failure, deadlock). Retryable.
    #[error("transaction conflict; retry")]
    Serialization,

    /// Connectivity or unclassified backend failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}
