//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use hive_shared::constants::{
    DEFAULT_HTTP_PORT, DEFAULT_LIKE_RETRY_BUDGET, DEFAULT_STORE_DEADLINE_MS,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `None`, meaning the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Upper bound on a single store call, including time spent waiting for
    /// the connection.
    /// Env: `STORE_DEADLINE_MS`
    /// Default: `5000`
    pub store_deadline: Duration,

    /// Attempts allowed for an optimistic like/unlike before giving up with
    /// a conflict.
    /// Env: `LIKE_RETRY_BUDGET`
    /// Default: `5`
    pub like_retry_budget: u32,

    /// Allowed CORS origin.
    /// Env: `CORS_ORIGIN`
    /// Default: `None` (any origin).
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            store_deadline: Duration::from_millis(DEFAULT_STORE_DEADLINE_MS),
            like_retry_budget: DEFAULT_LIKE_RETRY_BUDGET,
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = var("DATABASE_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = var("STORE_DEADLINE_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.store_deadline = Duration::from_millis(ms),
                _ => tracing::warn!(value = %val, "Invalid STORE_DEADLINE_MS, using default"),
            }
        }

        if let Some(val) = var("LIKE_RETRY_BUDGET") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.like_retry_budget = n,
                _ => tracing::warn!(value = %val, "Invalid LIKE_RETRY_BUDGET, using default"),
            }
        }

        if let Some(origin) = var("CORS_ORIGIN") {
            if !origin.is_empty() && origin != "*" {
                config.cors_origin = Some(origin);
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}
