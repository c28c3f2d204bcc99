// SPDX-License-Identifier: Apache-2.0
//! Service-level error taxonomy.
//!
//! Repositories surface their own raw errors; services map those into this
//! taxonomy; the HTTP edge maps each [`ErrorKind`] to a status code and the
//! response envelope. Variants carry exactly what the caller needs to act.

use crate::rbac::PermissionKey;

/// Coarse classification driving HTTP status mapping and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input. 400.
    InputInvalid,
    /// Missing, invalid, or expired credentials. 401.
    Unauthorized,
    /// Authenticated but not allowed. 403.
    Forbidden,
    /// Referenced entity missing. 404.
    NotFound,
    /// Uniqueness or state conflict. 409.
    Conflict,
    /// Backend unavailable; retryable. 503.
    Transient,
    /// Internal consistency breach. 500, with alert.
    Invariant,
}

/// Everything a service operation can fail with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed body, missing field, or out-of-range numeric.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Bearer token missing, unverifiable, or expired.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// The caller's claims lack a required permission key.
    #[error("missing permission: {0}")]
    MissingPermission(PermissionKey),

    /// Tenant header does not match the token's active organization.
    #[error("tenant mismatch: request is scoped to a different organization")]
    TenantMismatch,

    /// A referenced entity does not exist (or is outside the caller's tenant).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Registration or invitation hit an already-registered email.
    #[error("email already registered")]
    EmailInUse,

    /// Slug collision on organization or venue creation.
    #[error("slug already taken")]
    SlugInUse,

    /// A draft already exists for this venue.
    #[error("venue already has a draft revision")]
    DraftAlreadyExists,

    /// Removing or demoting the last Owner membership.
    #[error("OwnerRequired: organization must retain at least one owner")]
    OwnerRequired,

    /// Inviting or re-adding someone who is already a member.
    #[error("user is already a member of this organization")]
    AlreadyMember,

    /// Inviting an email that already has a pending invitation.
    #[error("a pending invitation already exists for this email")]
    InvitationPending,

    /// Creating a floor at a level index the revision already uses.
    #[error("a floor with this level index already exists")]
    DuplicateLevelIndex,

    /// Invitation token unknown, consumed, revoked, or expired.
    #[error("invalid or expired invitation")]
    InvalidInvitation,

    /// Write target is not owned by the venue's current draft.
    #[error("target is not part of an editable draft")]
    NotEditable,

    /// Publish requested while no draft exists.
    #[error("venue has no draft to publish")]
    NoDraft,

    /// `connectNodes` with identical endpoints.
    #[error("cannot connect a node to itself")]
    SelfLoop,

    /// Deep-copy found an edge whose endpoint was never copied.
    #[error("publish aborted: edge references a node outside the revision")]
    DanglingEdge,

    /// Seeded system role missing at runtime. Fatal misconfiguration.
    #[error("system role missing; database was not seeded")]
    SystemMisconfigured,

    /// Database or object storage unavailable; safe to retry.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Unclassified internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classifies this error for status mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::InvalidInvitation | Self::SelfLoop => {
                ErrorKind::InputInvalid
            }
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::MissingPermission(_) | Self::TenantMismatch => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::EmailInUse
            | Self::SlugInUse
            | Self::DraftAlreadyExists
            | Self::OwnerRequired
            | Self::AlreadyMember
            | Self::InvitationPending
            | Self::DuplicateLevelIndex
            | Self::NotEditable
            | Self::NoDraft => ErrorKind::Conflict,
            Self::Unavailable(_) => ErrorKind::Transient,
            Self::DanglingEdge | Self::SystemMisconfigured | Self::Internal(_) => {
                ErrorKind::Invariant
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_family_maps_to_conflict() {
        for err in [
            Error::EmailInUse,
            Error::DraftAlreadyExists,
            Error::OwnerRequired,
            Error::NotEditable,
            Error::NoDraft,
        ] {
            assert_eq!(err.kind(), ErrorKind::Conflict);
        }
    }

    #[test]
    fn invariant_family_is_internal() {
        assert_eq!(Error::DanglingEdge.kind(), ErrorKind::Invariant);
        assert_eq!(Error::SystemMisconfigured.kind(), ErrorKind::Invariant);
    }

    #[test]
    fn owner_required_message_names_the_reason() {
        assert!(Error::OwnerRequired.to_string().contains("OwnerRequired"));
    }
}
