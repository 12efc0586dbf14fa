//! Like ledger and the `posts.likes` counter.
//!
//! Each like/unlike runs one transaction that touches the ledger row and
//! moves the counter by exactly one. The counter write is conditional on the
//! `version` read at the start of the transaction; if another writer got in
//! first (or SQLite reports the database busy) the whole transaction is
//! rolled back and retried, up to `max_attempts` times.

use std::time::Duration;

use rusqlite::{params, OptionalExtension, TransactionBehavior};

use hive_shared::PostId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::LikeOutcome;
use crate::rows::{format_ts, now};

/// Pause before retrying after SQLite reported the database busy, scaled by
/// the attempt number.
const BUSY_BACKOFF: Duration = Duration::from_millis(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Like,
    Unlike,
}

struct CounterRow {
    likes: i64,
    version: i64,
    author_id: String,
    author_email: String,
}

impl Database {
    /// Record a like by `user_email` and increment the counter.
    ///
    /// A repeat like by the same email leaves everything untouched and
    /// reports `applied == false`.
    pub fn like_post(
        &mut self,
        post_id: PostId,
        user_email: &str,
        max_attempts: u32,
    ) -> Result<LikeOutcome> {
        self.adjust_likes(post_id, user_email, Direction::Like, max_attempts)
    }

    /// Remove the like by `user_email` and decrement the counter, never
    /// below zero. Unliking without a prior like is a no-op.
    pub fn unlike_post(
        &mut self,
        post_id: PostId,
        user_email: &str,
        max_attempts: u32,
    ) -> Result<LikeOutcome> {
        self.adjust_likes(post_id, user_email, Direction::Unlike, max_attempts)
    }

    pub fn has_liked(&self, post_id: PostId, user_email: &str) -> Result<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM post_likes WHERE post_id = ?1 AND user_email = ?2",
                params![post_id.to_string(), user_email],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn count_likes(&self, post_id: PostId) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1",
            params![post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn adjust_likes(
        &mut self,
        post_id: PostId,
        user_email: &str,
        direction: Direction,
        max_attempts: u32,
    ) -> Result<LikeOutcome> {
        let attempts = max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.try_adjust_likes(post_id, user_email, direction) {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => {
                    tracing::debug!(%post_id, attempt, "like counter version moved, retrying");
                }
                Err(e) if e.is_busy() => {
                    tracing::debug!(%post_id, attempt, "database busy, retrying like");
                    std::thread::sleep(BUSY_BACKOFF * attempt);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::warn!(%post_id, attempts, ?direction, "like counter update gave up");
        Err(StoreError::Conflict { attempts })
    }

    /// One optimistic attempt. `Ok(None)` means the version check failed and
    /// nothing was committed.
    fn try_adjust_likes(
        &mut self,
        post_id: PostId,
        user_email: &str,
        direction: Direction,
    ) -> Result<Option<LikeOutcome>> {
        let id = post_id.to_string();
        // IMMEDIATE takes the write lock up front so the busy timeout applies.
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let row = tx
            .query_row(
                "SELECT likes, version, author_id, author_email FROM posts WHERE id = ?1",
                params![id],
                |row| {
                    Ok(CounterRow {
                        likes: row.get(0)?,
                        version: row.get(1)?,
                        author_id: row.get(2)?,
                        author_email: row.get(3)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("post", post_id))?;

        let ledger_changed = match direction {
            Direction::Like => tx.execute(
                "INSERT OR IGNORE INTO post_likes (post_id, user_email, created_at)
                 VALUES (?1, ?2, ?3)",
                params![id, user_email, format_ts(&now())],
            )?,
            Direction::Unlike => tx.execute(
                "DELETE FROM post_likes WHERE post_id = ?1 AND user_email = ?2",
                params![id, user_email],
            )?,
        } > 0;

        let outcome = |likes: i64, applied: bool| LikeOutcome {
            likes: likes.max(0) as u64,
            applied,
            author_id: row.author_id.clone(),
            author_email: row.author_email.clone(),
        };

        if !ledger_changed {
            // Dropping the transaction rolls it back; nothing was written.
            return Ok(Some(outcome(row.likes, false)));
        }

        let next = match direction {
            Direction::Like => row.likes + 1,
            Direction::Unlike => (row.likes - 1).max(0),
        };

        let updated = tx.execute(
            "UPDATE posts SET likes = ?1, version = version + 1
             WHERE id = ?2 AND version = ?3",
            params![next, id, row.version],
        )?;
        if updated != 1 {
            return Ok(None);
        }

        tx.commit()?;
        Ok(Some(outcome(next, true)))
    }
}
