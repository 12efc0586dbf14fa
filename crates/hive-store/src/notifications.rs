//! Author notifications written after a like.

use rusqlite::params;

use hive_shared::PostId;

use crate::database::Database;
use crate::error::Result;
use crate::models::Notification;
use crate::rows::{format_ts, parse_ts, parse_uuid};

impl Database {
    pub fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.conn().execute(
            "INSERT INTO notifications
                 (id, recipient_id, recipient_email, post_id, message, created_at, is_read)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                notification.id.to_string(),
                notification.recipient_id,
                notification.recipient_email,
                notification.post_id.to_string(),
                notification.message,
                format_ts(&notification.created_at),
                notification.read as i64,
            ],
        )?;
        Ok(())
    }

    /// Notifications for one recipient, newest first.
    pub fn list_notifications(&self, recipient_id: &str) -> Result<Vec<Notification>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, recipient_id, recipient_email, post_id, message, created_at, is_read
             FROM notifications
             WHERE recipient_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![recipient_id], row_to_notification)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let id_str: String = row.get(0)?;
    let post_str: String = row.get(3)?;
    let created_str: String = row.get(5)?;
    let is_read: i64 = row.get(6)?;

    Ok(Notification {
        id: parse_uuid(0, &id_str)?,
        recipient_id: row.get(1)?,
        recipient_email: row.get(2)?,
        post_id: PostId(parse_uuid(3, &post_str)?),
        message: row.get(4)?,
        created_at: parse_ts(5, &created_str)?,
        read: is_read != 0,
    })
}
