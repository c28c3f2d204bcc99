// SPDX-License-Identifier: Apache-2.0
//! Audit trait implementation over Postgres.

use async_trait::async_trait;
use sqlx::QueryBuilder;

use atrium_core::audit::AuditEntry;
use atrium_core::OrgId;
use atrium_store::cursor::AuditCursor;
use atrium_store::{AuditPage, AuditQuery, AuditStore, StoreResult};

use crate::rows::AuditRow;
use crate::{map_sqlx, PgBackend};

#[async_trait]
impl AuditStore for PgBackend {
    async fn append(&self, entry: &AuditEntry) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO audit_logs \
             (id, organization_id, user_id, action, entity, entity_id, details, ip_address, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(entry.id.as_uuid())
        .bind(entry.org.as_uuid())
        .bind(entry.user.map(|u| u.as_uuid()))
        .bind(&entry.action)
        .bind(&entry.entity)
        .bind(&entry.entity_id)
        .bind(&entry.details)
        .bind(&entry.ip_address)
        .bind(entry.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn page(&self, org: OrgId, query: &AuditQuery) -> StoreResult<AuditPage> {
        let limit = query.limit.max(0);
        let mut builder = QueryBuilder::new(
            "SELECT id, organization_id, user_id, action, entity, entity_id, details, \
             ip_address, created_at FROM audit_logs WHERE organization_id = ",
        );
        builder.push_bind(org.as_uuid());
        if let Some(action) = &query.action {
            builder.push(" AND action = ").push_bind(action);
        }
        if let Some(user) = query.user {
            builder.push(" AND user_id = ").push_bind(user.as_uuid());
        }
        if let Some(cursor) = query.cursor {
            builder
                .push(" AND (created_at, id) < (")
                .push_bind(cursor.created_at)
                .push(", ")
                .push_bind(cursor.id.as_uuid())
                .push(")");
        }
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit + 1);

        let rows: Vec<AuditRow> = builder
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx)?;

        let mut entries: Vec<AuditEntry> = rows.into_iter().map(Into::into).collect();
        let has_more = entries.len() > usize::try_from(limit).unwrap_or(usize::MAX);
        entries.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
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
