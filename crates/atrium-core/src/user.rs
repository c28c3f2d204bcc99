// SPDX-License-Identifier: Apache-2.0
//! Global user identity.

use chrono::{DateTime, Utc};

use crate::id::UserId;

/// A person with a login. Users are global (email-unique) and join
/// organizations through memberships.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Login email, unique across the system. Stored lowercased.
    pub email: String,
    /// PHC-format password verifier.
    pub password_hash: String,
    /// Display name.
    pub full_name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Canonical form used for uniqueness checks and lookups.
    #[must_use]
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_ascii_lowercase()
    }
}
