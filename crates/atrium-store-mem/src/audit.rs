// SPDX-License-Identifier: Apache-2.0
//! Audit trait implementation.

use async_trait::async_trait;

use atrium_core::audit::AuditEntry;
use atrium_core::OrgId;
use atrium_store::cursor::AuditCursor;
use atrium_store::{AuditPage, AuditQuery, AuditStore, StoreResult};

use crate::MemBackend;

#[async_trait]
impl AuditStore for MemBackend {
    async fn append(&self, entry: &AuditEntry) -> StoreResult<()> {
        self.tables().audit.push(entry.clone());
        Ok(())
    }

    async fn page(&self, org: OrgId, query: &AuditQuery) -> StoreResult<AuditPage> {
        let t = self.tables();
        let mut entries: Vec<AuditEntry> = t
            .audit
            .iter()
            .filter(|e| e.org == org)
            .filter(|e| query.action.as_ref().is_none_or(|a| &e.action == a))
            .filter(|e| query.user.is_none_or(|u| e.user == Some(u)))
            .filter(|e| {
                query.cursor.is_none_or(|c| {
                    // Newest-first: only entries strictly older than the
                    // cursor position.
                    (e.created_at, e.id) < (c.created_at, c.id)
                })
            })
            .cloned()
            .collect();
        entries.sort_by_key(|e| std::cmp::Reverse((e.created_at, e.id)));

        let limit = usize::try_from(query.limit.max(0)).unwrap_or(0);
        let has_more = entries.len() > limit;
        entries.truncate(limit);
        let next_cursor = if has_more {
            entries.last().map(|e| {
                AuditCursor {
                    created_at: e.created_at,
                    id: e.id,
                }
                .encode()
            })
        } else {
            None
        };
        Ok(AuditPage {
            entries,
            next_cursor,
        })
    }
}
