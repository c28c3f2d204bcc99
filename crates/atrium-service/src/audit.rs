// SPDX-License-Identifier: Apache-2.0
//! Fire-and-forget audit trail.
//!
//! Requests submit entries to a bounded channel and move on; one worker
//! task drains the channel into storage. A full channel or a failed write
//! logs and drops the entry — audit must never fail or slow a business
//! request. Ordering is best-effort; timestamps come from the submitter.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use atrium_core::audit::AuditEntry;
use atrium_core::{AuditId, OrgId, Result, UserId};
use atrium_store::cursor::AuditCursor;
use atrium_store::{AuditPage, AuditQuery, AuditStore, Stores};

use crate::{clamp_limit, store_err, Actor};

/// Default page size for audit reads.
const DEFAULT_PAGE: i64 = 20;
/// Maximum page size for audit reads.
const MAX_PAGE: i64 = 100;

/// Cheap handle for submitting audit entries.
#[derive(Clone)]
pub struct AuditRecorder {
    tx: mpsc::Sender<AuditEntry>,
}

impl AuditRecorder {
    /// Builds and submits an entry. Never blocks; a saturated queue drops
    /// the entry with a warning.
    pub fn record(
        &self,
        org: OrgId,
        user: Option<UserId>,
        action: &str,
        entity: &str,
        entity_id: &str,
        details: serde_json::Value,
    ) {
        let entry = AuditEntry {
            id: AuditId::generate(),
            org,
            user,
            action: action.to_owned(),
            entity: entity.to_owned(),
            entity_id: entity_id.to_owned(),
            details,
            ip_address: String::new(),
            created_at: Utc::now(),
        };
        if let Err(err) = self.tx.try_send(entry) {
            warn!(action, error = %err, "audit entry dropped");
        }
    }
}

/// The audit pipeline: spawns the single worker task.
pub struct AuditTrail;

impl AuditTrail {
    /// Spawns the worker draining a bounded channel of `capacity` into
    /// `store`. The worker exits once every [`AuditRecorder`] clone has
    /// been dropped and the channel is drained; await the handle on
    /// shutdown for a clean flush.
    #[must_use]
    pub fn spawn(store: Arc<dyn AuditStore>, capacity: usize) -> (AuditRecorder, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<AuditEntry>(capacity);
        let handle = tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(err) = store.append(&entry).await {
                    // Log and drop: audit failures never surface to
                    // callers.
                    warn!(action = %entry.action, error = %err, "audit write failed");
                }
            }
        });
        (AuditRecorder { tx }, handle)
    }
}

/// Paged audit reads.
#[derive(Clone)]
pub struct AuditService {
    stores: Stores,
}

impl AuditService {
    /// Builds the service over a storage bundle.
    #[must_use]
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// One page of the caller-org's audit trail, newest first. Undecodable
    /// cursors read as "from the top".
    pub async fn page(
        &self,
        actor: Actor,
        cursor: Option<&str>,
        limit: Option<i64>,
        action: Option<String>,
        user: Option<UserId>,
    ) -> Result<AuditPage> {
        let query = AuditQuery {
            cursor: cursor.and_then(AuditCursor::decode),
            limit: clamp_limit(limit, DEFAULT_PAGE, MAX_PAGE),
            action,
            user,
        };
        self.stores
            .audit
            .page(actor.org, &query)
            .await
            .map_err(store_err)
    }
}

#[cfg(test)]
mod tests {
    use atrium_store_mem::MemBackend;

    use super::*;

    #[tokio::test]
    async fn worker_drains_and_exits_on_close() {
        let stores = MemBackend::new().stores();
        let (recorder, worker) = AuditTrail::spawn(stores.audit.clone(), 8);
        let org = OrgId::generate();
        for i in 0..3 {
            recorder.record(
                org,
                None,
                "venue.create",
                "venue",
                &format!("v{i}"),
                serde_json::Value::Null,
            );
        }
        drop(recorder);
        worker.await.unwrap();

        let service = AuditService::new(stores);
        let actor = Actor {
            user: UserId::generate(),
            org,
        };
        let page = service.page(actor, None, None, None, None).await.unwrap();
        assert_eq!(page.entries.len(), 3);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn reads_are_tenant_scoped() {
        let stores = MemBackend::new().stores();
        let (recorder, worker) = AuditTrail::spawn(stores.audit.clone(), 8);
        let org_a = OrgId::generate();
        let org_b = OrgId::generate();
        recorder.record(org_a, None, "venue.create", "venue", "v", serde_json::Value::Null);
        drop(recorder);
        worker.await.unwrap();

        let service = AuditService::new(stores);
        let page = service
            .page(
                Actor {
                    user: UserId::generate(),
                    org: org_b,
                },
                None,
                None,
                None,
                None,
            )
            .await
            .unwrap();
        assert!(page.entries.is_empty());
    }
}
