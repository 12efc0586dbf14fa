//! v001 -- Initial schema creation.
//!
//! Creates `users`, `posts`, and `comments`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (owned by the account service, read-only to the feed)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id          TEXT PRIMARY KEY NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    username    TEXT NOT NULL,
    avatar_url  TEXT,
    preferences TEXT NOT NULL DEFAULT '[]'    -- JSON array of tags
);

-- ----------------------------------------------------------------
-- Posts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id                      TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    content                 TEXT NOT NULL,
    likes                   INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
    version                 INTEGER NOT NULL DEFAULT 0,  -- bumped on every counter write
    author_id               TEXT NOT NULL,
    author_email            TEXT NOT NULL,
    author_username         TEXT NOT NULL,
    media_urls              TEXT NOT NULL DEFAULT '[]',  -- JSON arrays below
    design_disciplines      TEXT NOT NULL DEFAULT '[]',
    design_process          TEXT NOT NULL DEFAULT '[]',
    tools                   TEXT NOT NULL DEFAULT '[]',
    learning_goals          TEXT NOT NULL DEFAULT '[]',
    competition_involvement TEXT NOT NULL DEFAULT '[]',
    skill_level             TEXT,
    created_at              TEXT NOT NULL,               -- RFC-3339, microseconds
    updated_at              TEXT
);

CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);

-- ----------------------------------------------------------------
-- Comments (id space is per post)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    post_id       TEXT NOT NULL,               -- FK -> posts(id)
    id            TEXT NOT NULL,               -- UUID v4
    comment_email TEXT NOT NULL,
    comment_user  TEXT NOT NULL,
    text          TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    edited_at     TEXT,

    PRIMARY KEY (post_id, id),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_post_ts ON comments(post_id, created_at ASC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
