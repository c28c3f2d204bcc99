// SPDX-License-Identifier: Apache-2.0
//! Business services for the Atrium backend.
//!
//! Each service owns one slice of behavior, holds the storage capability
//! bundle by value (cheap `Arc` clones), and maps raw store errors into
//! the service-level taxonomy. Permission checks happen at the HTTP edge
//! against token claims; services enforce tenant scope and domain rules.

pub mod audit;
pub mod editor;
pub mod identity;
pub mod media;
pub mod projection;
pub mod publish;
pub mod rbac;
pub mod team;
pub mod venue;

use atrium_core::{Error, OrgId, UserId};
use atrium_store::{Constraint, StoreError};

pub use audit::{AuditRecorder, AuditService, AuditTrail};
pub use editor::EditorService;
pub use identity::AuthService;
pub use media::MediaService;
pub use projection::ManifestService;
pub use publish::PublishService;
pub use rbac::RoleService;
pub use team::TeamService;
pub use venue::VenueService;

/// The authenticated caller, as resolved from token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Acting user.
    pub user: UserId,
    /// Active tenant the token was minted for.
    pub org: OrgId,
}

/// Maps raw store errors into the service taxonomy.
pub(crate) fn store_err(err: StoreError) -> Error {
    match err {
        StoreError::NotFound(what) => Error::NotFound(what),
        StoreError::Duplicate(Constraint::UserEmail) => Error::EmailInUse,
        StoreError::Duplicate(Constraint::OrgSlug | Constraint::VenueSlug) => Error::SlugInUse,
        StoreError::Duplicate(Constraint::Membership) => Error::AlreadyMember,
        StoreError::Duplicate(Constraint::FloorLevel) => Error::DuplicateLevelIndex,
        // Random 256-bit token collision: not a caller problem.
        StoreError::Duplicate(Constraint::InvitationToken) => {
            Error::Internal("invitation token collision".into())
        }
        StoreError::LastOwner => Error::OwnerRequired,
        StoreError::DraftExists => Error::DraftAlreadyExists,
        StoreError::NoDraft => Error::NoDraft,
        StoreError::DanglingEdge => Error::DanglingEdge,
        StoreError::Serialization => Error::Unavailable("transaction conflict".into()),
        StoreError::Backend(message) => Error::Unavailable(message),
    }
}

/// Clamps a client-supplied page size to `[1, max]`, defaulting when absent
/// or non-positive.
pub(crate) fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    match limit {
        Some(value) if value > 0 => value.min(max),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_clamp_to_bounds() {
        assert_eq!(clamp_limit(None, 10, 100), 10);
        assert_eq!(clamp_limit(Some(0), 10, 100), 10);
        assert_eq!(clamp_limit(Some(-3), 10, 100), 10);
        assert_eq!(clamp_limit(Some(42), 10, 100), 42);
        assert_eq!(clamp_limit(Some(1000), 10, 100), 100);
    }

    #[test]
    fn duplicate_constraints_map_to_conflicts() {
        assert_eq!(
            store_err(StoreError::Duplicate(Constraint::UserEmail)),
            Error::EmailInUse
        );
        assert_eq!(store_err(StoreError::LastOwner), Error::OwnerRequired);
        assert_eq!(store_err(StoreError::NoDraft), Error::NoDraft);
    }
}
