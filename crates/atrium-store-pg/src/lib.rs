// SPDX-License-Identifier: Apache-2.0
//! PostgreSQL implementation of the Atrium storage contracts.
//!
//! One [`PgBackend`] over a shared connection pool implements every store
//! trait. Multi-row operations (registration, invitation acceptance,
//! guarded membership mutations, publish) run inside explicit
//! transactions; the publish transaction additionally takes a
//! `SELECT … FOR UPDATE` lock on the venue row so concurrent publishes
//! serialize.

mod audit;
mod content;
mod graph;
mod identity;
mod rows;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use atrium_store::{Constraint, StoreError, Stores};

/// Embedded schema migrations, applied at daemon startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Shared-pool Postgres backend implementing every store trait.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool of `max_connections` to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(map_sqlx)?;
        Ok(Self::new(pool))
    }

    /// Applies pending migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))
    }

    /// Bundles this backend into the [`Stores`] aggregate.
    #[must_use]
    pub fn stores(&self) -> Stores {
        Stores {
            users: Arc::new(self.clone()),
            orgs: Arc::new(self.clone()),
            roles: Arc::new(self.clone()),
            memberships: Arc::new(self.clone()),
            invitations: Arc::new(self.clone()),
            venues: Arc::new(self.clone()),
            areas: Arc::new(self.clone()),
            media: Arc::new(self.clone()),
            revisions: Arc::new(self.clone()),
            graph: Arc::new(self.clone()),
            audit: Arc::new(self.clone()),
        }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a unique-index name from the schema to its [`Constraint`].
fn constraint_by_name(name: &str) -> Option<Constraint> {
    match name {
        "users_email_key" => Some(Constraint::UserEmail),
        "organizations_slug_key" => Some(Constraint::OrgSlug),
        "venues_slug_key" => Some(Constraint::VenueSlug),
        "memberships_org_user_key" => Some(Constraint::Membership),
        "floors_revision_level_key" => Some(Constraint::FloorLevel),
        "invitations_token_key" => Some(Constraint::InvitationToken),
        _ => None,
    }
}

/// Translates sqlx errors into the raw store taxonomy.
pub(crate) fn map_sqlx(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => {
            if let Some(constraint) = db.constraint().and_then(constraint_by_name) {
                return StoreError::Duplicate(constraint);
            }
            // 40001 serialization_failure, 40P01 deadlock_detected.
            match db.code().as_deref() {
                Some("40001" | "40P01") => StoreError::Serialization,
                _ => StoreError::Backend(db.to_string()),
            }
        }
        sqlx::Error::PoolTimedOut => StoreError::Backend("connection pool timed out".into()),
        _ => StoreError::Backend(err.to_string()),
    }
}
