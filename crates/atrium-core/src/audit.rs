// SPDX-License-Identifier: Apache-2.0
//! Audit trail entries.

use chrono::{DateTime, Utc};

use crate::id::{AuditId, OrgId, UserId};

/// One recorded action.
///
/// Entries are submitted fire-and-forget; timestamps come from the
/// submitter, and ordering across workers is best-effort.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    /// Entry identifier.
    pub id: AuditId,
    /// Organization the action happened in.
    pub org: OrgId,
    /// Acting user; `None` for system-initiated actions.
    pub user: Option<UserId>,
    /// Dotted action name, e.g. `graph.publish` or `member.remove`.
    pub action: String,
    /// Entity class the action touched ("venue", "node", "membership").
    pub entity: String,
    /// Identifier of the touched entity, stringified.
    pub entity_id: String,
    /// Free-form structured context.
    pub details: serde_json::Value,
    /// Submitting client address, when known.
    pub ip_address: String,
    /// Submitter-side timestamp.
    pub created_at: DateTime<Utc>,
}
