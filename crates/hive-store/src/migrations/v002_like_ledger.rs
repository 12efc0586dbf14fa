use rusqlite::Connection;

const UP_SQL: &str = r#"
-- One row per (post, liker); the posts.likes counter is kept in step with it
CREATE TABLE IF NOT EXISTS post_likes (
    post_id    TEXT NOT NULL,              -- FK -> posts(id)
    user_email TEXT NOT NULL,
    created_at TEXT NOT NULL,

    PRIMARY KEY (post_id, user_email),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
