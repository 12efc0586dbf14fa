//! Async handle to the SQLite store.
//!
//! [`Database`] is synchronous and owns a single connection, so every call is
//! moved onto tokio's blocking pool and bounded by a deadline. Hitting the
//! deadline surfaces as [`ServerError::StoreUnavailable`]; the blocking call
//! itself still runs to completion.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hive_store::Database;

use crate::error::ServerError;

#[derive(Clone)]
pub struct FeedStore {
    db: Arc<Mutex<Database>>,
    deadline: Duration,
}

impl FeedStore {
    pub fn new(db: Database, deadline: Duration) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            deadline,
        }
    }

    /// Run a read-only closure against the database.
    pub async fn read<T, F>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&Database) -> hive_store::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run(move |db: &mut Database| f(db)).await
    }

    /// Run a closure that may write, with mutable access for transactions.
    pub async fn transact<T, F>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&mut Database) -> hive_store::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run(f).await
    }

    async fn run<T, F>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&mut Database) -> hive_store::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let task = tokio::task::spawn_blocking(move || {
            let mut guard = db
                .lock()
                .map_err(|_| ServerError::Internal("database mutex poisoned".into()))?;
            f(&mut guard).map_err(ServerError::from)
        });

        match tokio::time::timeout(self.deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ServerError::Internal(format!(
                "store task failed: {join_err}"
            ))),
            Err(_) => {
                tracing::warn!(deadline_ms = self.deadline.as_millis() as u64, "store call timed out");
                Err(ServerError::StoreUnavailable(format!(
                    "no response within {} ms",
                    self.deadline.as_millis()
                )))
            }
        }
    }
}
