//! Read access to user accounts.
//!
//! Accounts are owned elsewhere; the feed only resolves them. `upsert_user`
//! exists so the binary can be seeded and tests can create fixtures.

use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;
use crate::models::UserSummary;
use crate::rows::{encode_list, parse_list};

impl Database {
    pub fn upsert_user(&self, user: &UserSummary) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, email, username, avatar_url, preferences)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 email       = excluded.email,
                 username    = excluded.username,
                 avatar_url  = excluded.avatar_url,
                 preferences = excluded.preferences",
            params![
                user.id,
                user.email,
                user.username,
                user.avatar_url,
                encode_list(&user.preferences)?,
            ],
        )?;
        Ok(())
    }

    pub fn find_user_by_id(&self, id: &str) -> Result<Option<UserSummary>> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, email, username, avatar_url, preferences FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Emails are matched exactly.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserSummary>> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, email, username, avatar_url, preferences FROM users WHERE email = ?1",
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserSummary> {
    let prefs: String = row.get(4)?;
    Ok(UserSummary {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        avatar_url: row.get(3)?,
        preferences: parse_list(4, &prefs)?,
    })
}
