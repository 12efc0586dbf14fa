//! # hive-server
//!
//! HTTP service for the DesignHive feed.
//!
//! This binary provides:
//! - **Posts**: publish, list, per-author listing, patch, delete, keyword search
//! - **Engagement**: like/unlike with an atomic counter and a per-user ledger,
//!   plus comments nested under each post
//! - **Recommendations**: posts whose tags overlap a user's preferences
//! - **Enrichment**: every listed post or comment carries its author's current
//!   profile, fetched with one lookup per distinct author
//! - **Notifications**: post authors are told about new likes in the background

mod api;
mod config;
mod directory;
mod enrich;
mod error;
mod feed;
mod notify;
mod store;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use hive_shared::constants::APP_NAME;
use hive_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::directory::{AuthorDirectory, StoreUserLookup};
use crate::feed::Feed;
use crate::notify::{Notifier, StoreNotifier};
use crate::store::FeedStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hive_server=debug,hive_store=debug")),
        )
        .init();

    info!("Starting {APP_NAME} feed server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database (runs migrations)
    // -----------------------------------------------------------------------
    let database = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    if let Some(path) = database.path() {
        info!(path = %path.display(), "Database ready");
    }

    // -----------------------------------------------------------------------
    // 4. Wire the feed service
    // -----------------------------------------------------------------------
    let store = FeedStore::new(database, config.store_deadline);
    let directory = AuthorDirectory::new(Arc::new(StoreUserLookup::new(store.clone())));
    let notifier: Arc<dyn Notifier> = Arc::new(StoreNotifier::new(store.clone()));
    let feed = Feed::new(store, directory, notifier, config.like_retry_budget);

    let http_addr = config.http_addr;
    let app_state = AppState {
        feed,
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
