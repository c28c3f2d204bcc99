// SPDX-License-Identifier: Apache-2.0
//! Environment configuration.

use std::env;

use anyhow::{bail, Result};

/// Everything the daemon reads from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port.
    pub port: u16,
    /// Database host.
    pub db_host: String,
    /// Database port.
    pub db_port: u16,
    /// Database user.
    pub db_user: String,
    /// Database password.
    pub db_password: String,
    /// Database name.
    pub db_name: String,
    /// Connection pool size.
    pub db_pool_size: u32,
    /// HMAC secret for session tokens.
    pub jwt_secret: Option<String>,
    /// Object-storage endpoint.
    pub minio_endpoint: String,
    /// Object-storage access key.
    pub minio_access_key: String,
    /// Object-storage secret key.
    pub minio_secret_key: String,
    /// Object-storage region.
    pub minio_region: String,
    /// Upload bucket.
    pub minio_bucket: String,
    /// Public base URL assets are served from.
    pub cdn_base_url: String,
}

fn var_or(key: &str, fallback: &str) -> String {
    env::var(key).unwrap_or_else(|_| fallback.to_owned())
}

impl Config {
    /// Reads the configuration, applying development defaults for
    /// everything except the token secret.
    pub fn from_env() -> Result<Self> {
        let port = var_or("PORT", "8080");
        let Ok(port) = port.parse() else {
            bail!("PORT is not a valid port number: {port}");
        };
        let db_port = var_or("DB_PORT", "5432");
        let Ok(db_port) = db_port.parse() else {
            bail!("DB_PORT is not a valid port number: {db_port}");
        };
        Ok(Self {
            port,
            db_host: var_or("DB_HOST", "localhost"),
            db_port,
            db_user: var_or("DB_USER", "atrium"),
            db_password: var_or("DB_PASSWORD", ""),
            db_name: var_or("DB_NAME", "atrium"),
            db_pool_size: 10,
            jwt_secret: env::var("JWT_SECRET").ok(),
            minio_endpoint: var_or("MINIO_ENDPOINT", "http://localhost:9000"),
            minio_access_key: var_or("MINIO_ACCESS_KEY", "minioadmin"),
            minio_secret_key: var_or("MINIO_SECRET_KEY", "minioadmin"),
            minio_region: var_or("MINIO_REGION", "us-east-1"),
            minio_bucket: var_or("MINIO_BUCKET", "panoramas"),
            cdn_base_url: var_or("CDN_BASE_URL", "http://localhost:9000/panoramas"),
        })
    }

    /// Postgres connection URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}
