// SPDX-License-Identifier: Apache-2.0
//! Atrium backend daemon (atriumd).
//!
//! Wires configuration, storage, the blob store, the audit worker, and
//! the HTTP router, then serves until interrupted. `--memory` swaps the
//! Postgres and MinIO collaborators for in-process stand-ins — useful for
//! demos and local frontend work.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::HeaderName;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use atrium_auth::token::TokenCodec;
use atrium_blob::{BlobStore, FakeBlobStore, S3BlobStore};
use atrium_http::AppState;
use atrium_service::audit::AuditTrail;
use atrium_service::media::MediaConfig;
use atrium_service::rbac::bootstrap_system_roles;
use atrium_store::Stores;
use atrium_store_mem::MemBackend;
use atrium_store_pg::PgBackend;

use crate::config::Config;

/// Per-request deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Audit queue capacity.
const AUDIT_QUEUE: usize = 1024;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Serve from an in-memory backend instead of Postgres/MinIO.
    #[clap(long)]
    memory: bool,

    /// Override the listen port (falls back to the PORT variable).
    #[clap(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let port = args.port.unwrap_or(config.port);

    let (stores, blob): (Stores, Arc<dyn BlobStore>) = if args.memory {
        info!("running with the in-memory backend; nothing will persist");
        (
            MemBackend::new().stores(),
            Arc::new(FakeBlobStore::new()) as Arc<dyn BlobStore>,
        )
    } else {
        let backend = PgBackend::connect(&config.database_url(), config.db_pool_size)
            .await
            .context("connecting to the database")?;
        backend.migrate().await.context("applying migrations")?;
        let blob = S3BlobStore::connect(
            &config.minio_endpoint,
            &config.minio_access_key,
            &config.minio_secret_key,
            &config.minio_region,
        );
        (backend.stores(), Arc::new(blob) as Arc<dyn BlobStore>)
    };

    bootstrap_system_roles(&stores)
        .await
        .context("seeding system roles")?;

    let secret = match config.jwt_secret {
        Some(secret) => secret,
        None if args.memory => {
            warn!("JWT_SECRET unset; using an ephemeral development secret");
            atrium_auth::token::random_opaque_token()
        }
        None => anyhow::bail!("JWT_SECRET must be set"),
    };

    let (recorder, audit_worker) = AuditTrail::spawn(stores.audit.clone(), AUDIT_QUEUE);
    let state = AppState::new(
        stores,
        TokenCodec::new(secret.as_bytes()),
        blob,
        MediaConfig {
            bucket: config.minio_bucket,
            cdn_base_url: config.cdn_base_url,
        },
        recorder,
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-tenant-id"),
        ]);
    let app = atrium_http::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding port {port}"))?;
    info!(port, "atriumd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    // The router (and with it every audit recorder clone) is gone once
    // serve returns; awaiting the worker drains whatever is queued.
    info!("draining audit queue");
    audit_worker.await.context("audit worker panicked")?;
    info!("bye");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("failed to install the shutdown handler");
        return;
    }
    info!("shutdown signal received");
}
