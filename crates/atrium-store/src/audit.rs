// SPDX-License-Identifier: Apache-2.0
//! Audit-trail storage capability.

use async_trait::async_trait;

use atrium_core::audit::AuditEntry;
use atrium_core::{OrgId, UserId};

use crate::cursor::AuditCursor;
use crate::StoreResult;

/// Filters and pagination for an audit page read.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Resume position from a previous page, newest-first ordering.
    pub cursor: Option<AuditCursor>,
    /// Page size; callers clamp to their own maximum.
    pub limit: i64,
    /// Only entries with this exact action name.
    pub action: Option<String>,
    /// Only entries by this actor.
    pub user: Option<UserId>,
}

/// One page of audit entries.
#[derive(Debug, Clone)]
pub struct AuditPage {
    /// Entries, newest first.
    pub entries: Vec<AuditEntry>,
    /// Cursor for the next page; `None` when this page was the last.
    pub next_cursor: Option<String>,
}

/// Audit trail.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Appends one entry. Called only from the audit worker.
    async fn append(&self, entry: &AuditEntry) -> StoreResult<()>;

    /// Cursor-paginated read, newest first, scoped to one organization.
    async fn page(&self, org: OrgId, query: &AuditQuery) -> StoreResult<AuditPage>;
}
