use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS notifications (
    id              TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    recipient_id    TEXT NOT NULL,
    recipient_email TEXT NOT NULL,
    post_id         TEXT NOT NULL,              -- no FK: outlives the post
    message         TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0  -- boolean 0/1
);

CREATE INDEX IF NOT EXISTS idx_notifications_recipient
    ON notifications(recipient_id, created_at DESC);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
