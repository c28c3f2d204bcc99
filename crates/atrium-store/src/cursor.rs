// SPDX-License-Identifier: Apache-2.0
//! Opaque pagination cursors for the audit trail.
//!
//! A cursor encodes the sort key of the last row a page returned —
//! `(created_at, id)` — as unpadded URL-safe base64. Clients treat it as
//! opaque; an undecodable cursor simply reads as "no cursor".

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use atrium_core::AuditId;

/// Decoded audit-log pagination position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditCursor {
    /// Creation timestamp of the last seen entry.
    pub created_at: DateTime<Utc>,
    /// Identifier of the last seen entry (tie-breaker).
    pub id: AuditId,
}

impl AuditCursor {
    /// Encodes the cursor as an opaque string.
    #[must_use]
    pub fn encode(&self) -> String {
        let raw = format!(
            "{}:{}",
            self.created_at.timestamp_micros(),
            self.id.as_uuid()
        );
        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Decodes an opaque cursor string. Returns `None` for anything that
    /// does not parse — malformed cursors are ignored, not errors.
    #[must_use]
    pub fn decode(token: &str) -> Option<Self> {
        let raw = URL_SAFE_NO_PAD.decode(token).ok()?;
        let raw = std::str::from_utf8(&raw).ok()?;
        let (micros, id) = raw.split_once(':')?;
        let micros: i64 = micros.parse().ok()?;
        let created_at = Utc.timestamp_micros(micros).single()?;
        let id = AuditId::from_uuid(Uuid::parse_str(id).ok()?);
        Some(Self { created_at, id })
    }
}
