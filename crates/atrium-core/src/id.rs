// SPDX-License-Identifier: Apache-2.0
//! Strongly typed identifiers.
//!
//! Every primary identifier in the system is an opaque 128-bit token. Each
//! entity class gets its own wrapper so that a floor id can never be handed
//! to an operation expecting a node id; the underlying uuid is reachable
//! only through [`as_uuid`](OrgId::as_uuid) at storage boundaries.

use std::fmt;

use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[repr(transparent)]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mints a fresh random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps a raw uuid read back from storage or a request path.
            #[must_use]
            pub const fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying uuid.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Identifier of an [`Organization`](crate::org::Organization) (a tenant).
    OrgId
);
entity_id!(
    /// Identifier of a global [`User`](crate::user::User).
    UserId
);
entity_id!(
    /// Identifier of a [`Role`](crate::rbac::Role), system or custom.
    RoleId
);
entity_id!(
    /// Identifier of a [`Membership`](crate::org::Membership) row.
    MembershipId
);
entity_id!(
    /// Identifier of a pending [`Invitation`](crate::org::Invitation).
    InvitationId
);
entity_id!(
    /// Identifier of a [`Venue`](crate::venue::Venue).
    VenueId
);
entity_id!(
    /// Identifier of a [`Revision`](crate::revision::Revision).
    RevisionId
);
entity_id!(
    /// Identifier of a [`Floor`](crate::revision::Floor).
    FloorId
);
entity_id!(
    /// Identifier of a graph [`Node`](crate::revision::Node).
    NodeId
);
entity_id!(
    /// Identifier of a directed graph [`Edge`](crate::revision::Edge).
    EdgeId
);
entity_id!(
    /// Identifier of a stored [`MediaAsset`](crate::media::MediaAsset).
    AssetId
);
entity_id!(
    /// Identifier of an [`Area`](crate::venue::Area) (semantic region).
    AreaId
);
entity_id!(
    /// Identifier of an [`AuditEntry`](crate::audit::AuditEntry).
    AuditId
);
