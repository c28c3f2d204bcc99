// SPDX-License-Identifier: Apache-2.0
//! Venues and their semantic areas.

use chrono::{DateTime, Utc};

use crate::id::{AreaId, OrgId, RevisionId, VenueId};

/// A physical site owning floor maps.
///
/// Carries exactly two revision pointers: `live_revision` (what mobile
/// clients see; null until the first publish) and `draft_revision` (the
/// single mutable edit session; null until the first edit).
#[derive(Debug, Clone, PartialEq)]
pub struct Venue {
    /// Venue identifier.
    pub id: VenueId,
    /// Owning organization.
    pub org: OrgId,
    /// Display name.
    pub name: String,
    /// URL-safe slug used by the public manifest endpoint.
    pub slug: String,
    /// Free-form description.
    pub description: String,
    /// Currently served published revision, if any.
    pub live_revision: Option<RevisionId>,
    /// Current edit-session revision, if any.
    pub draft_revision: Option<RevisionId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A labeled semantic region (room, facility) within a venue.
///
/// Areas live outside the revision tree: nodes reference them by id and
/// publishing never copies them, so labels stay stable across revisions.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    /// Area identifier.
    pub id: AreaId,
    /// Owning venue.
    pub venue: VenueId,
    /// Display name ("Food Court", "Gate B2").
    pub name: String,
    /// Coarse classification for icons and filtering.
    pub category: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Derives a URL-safe slug from a display name.
///
/// Lowercases, maps runs of non-alphanumerics to single dashes, and trims
/// leading/trailing dashes. Callers append a random suffix for uniqueness.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
