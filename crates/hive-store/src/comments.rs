//! CRUD operations for [`Comment`] records nested under a post.

use rusqlite::params;

use hive_shared::{CommentId, PostId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Comment;
use crate::rows::{format_ts, now, parse_ts, parse_uuid};

impl Database {
    /// Attach a comment to `post_id`. The commenter's identity must already
    /// have been resolved by the caller.
    pub fn add_comment(
        &self,
        post_id: PostId,
        comment_email: &str,
        comment_user: &str,
        text: &str,
    ) -> Result<Comment> {
        if !self.post_exists(post_id)? {
            return Err(StoreError::not_found("post", post_id));
        }

        let comment = Comment {
            comment_id: CommentId::new(),
            post_id,
            comment_email: comment_email.to_string(),
            comment_user: comment_user.to_string(),
            text: text.to_string(),
            created_at: now(),
            edited_at: None,
        };

        self.conn().execute(
            "INSERT INTO comments (post_id, id, comment_email, comment_user, text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                post_id.to_string(),
                comment.comment_id.to_string(),
                comment.comment_email,
                comment.comment_user,
                comment.text,
                format_ts(&comment.created_at),
            ],
        )?;

        Ok(comment)
    }

    /// Comments under a post, oldest first.
    pub fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        if !self.post_exists(post_id)? {
            return Err(StoreError::not_found("post", post_id));
        }

        let mut stmt = self.conn().prepare(
            "SELECT post_id, id, comment_email, comment_user, text, created_at, edited_at
             FROM comments
             WHERE post_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![post_id.to_string()], row_to_comment)?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    pub fn get_comment(&self, post_id: PostId, comment_id: CommentId) -> Result<Comment> {
        self.conn()
            .query_row(
                "SELECT post_id, id, comment_email, comment_user, text, created_at, edited_at
                 FROM comments WHERE post_id = ?1 AND id = ?2",
                params![post_id.to_string(), comment_id.to_string()],
                row_to_comment,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("comment", comment_id),
                other => StoreError::Sqlite(other),
            })
    }

    pub fn count_comments(&self, post_id: PostId) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
            params![post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Replace the text and stamp `edited_at`.
    pub fn edit_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
        text: &str,
    ) -> Result<Comment> {
        let affected = self.conn().execute(
            "UPDATE comments SET text = ?3, edited_at = ?4 WHERE post_id = ?1 AND id = ?2",
            params![
                post_id.to_string(),
                comment_id.to_string(),
                text,
                format_ts(&now()),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("comment", comment_id));
        }
        self.get_comment(post_id, comment_id)
    }

    /// Delete a comment. A comment that does not exist under `post_id` is an
    /// error, the same as for [`Database::edit_comment`].
    pub fn delete_comment(&self, post_id: PostId, comment_id: CommentId) -> Result<()> {
        let affected = self.conn().execute(
            "DELETE FROM comments WHERE post_id = ?1 AND id = ?2",
            params![post_id.to_string(), comment_id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("comment", comment_id));
        }
        Ok(())
    }
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let post_id_str: String = row.get(0)?;
    let id_str: String = row.get(1)?;
    let created_str: String = row.get(5)?;
    let edited_str: Option<String> = row.get(6)?;

    Ok(Comment {
        comment_id: CommentId(parse_uuid(1, &id_str)?),
        post_id: PostId(parse_uuid(0, &post_id_str)?),
        comment_email: row.get(2)?,
        comment_user: row.get(3)?,
        text: row.get(4)?,
        created_at: parse_ts(5, &created_str)?,
        edited_at: edited_str.map(|s| parse_ts(6, &s)).transpose()?,
    })
}
