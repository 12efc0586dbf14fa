//! # hive-store
//!
//! SQLite persistence for the DesignHive feed.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for posts, their
//! comments, the per-user like ledger, the (read-only to the feed) user
//! directory, and like notifications. Async callers are expected to move
//! calls onto a blocking thread.

pub mod comments;
pub mod database;
pub mod likes;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod posts;
pub mod users;

mod error;
mod rows;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
