//! CRUD operations for [`Post`] records.

use rusqlite::{params, OptionalExtension};

use hive_shared::{PostId, PostTags};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Post, PostDraft, PostPatch};
use crate::rows::{encode_list, format_ts, now, parse_list, parse_ts, parse_uuid};

const POST_COLUMNS: &str = "id, content, likes, author_id, author_email, author_username,
     media_urls, design_disciplines, design_process, tools, learning_goals,
     competition_involvement, skill_level, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Persist a new post. The store assigns the id, zeroes the counter and
    /// stamps `created_at`; everything else is copied from the draft.
    pub fn create_post(&self, draft: PostDraft) -> Result<Post> {
        let post = Post {
            id: PostId::new(),
            content: draft.content,
            like_count: 0,
            author_id: draft.author_id,
            author_email: draft.author_email,
            author_username: draft.author_username,
            media_urls: draft.media_urls,
            tags: draft.tags,
            created_at: now(),
            updated_at: None,
        };

        self.conn().execute(
            "INSERT INTO posts (id, content, likes, author_id, author_email, author_username,
                                media_urls, design_disciplines, design_process, tools,
                                learning_goals, competition_involvement, skill_level, created_at)
             VALUES (?1, ?2, 0, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                post.id.to_string(),
                post.content,
                post.author_id,
                post.author_email,
                post.author_username,
                encode_list(&post.media_urls)?,
                encode_list(&post.tags.design_disciplines)?,
                encode_list(&post.tags.design_process)?,
                encode_list(&post.tags.tools)?,
                encode_list(&post.tags.learning_goals)?,
                encode_list(&post.tags.competition_involvement)?,
                post.tags.skill_level,
                format_ts(&post.created_at),
            ],
        )?;

        tracing::debug!(post_id = %post.id, author = %post.author_id, "post created");
        Ok(post)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single post.
    pub fn get_post(&self, id: PostId) -> Result<Post> {
        self.find_post(id)?
            .ok_or_else(|| StoreError::not_found("post", id))
    }

    pub fn find_post(&self, id: PostId) -> Result<Option<Post>> {
        let post = self
            .conn()
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id.to_string()],
                row_to_post,
            )
            .optional()?;
        Ok(post)
    }

    pub fn post_exists(&self, id: PostId) -> Result<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM posts WHERE id = ?1",
                params![id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Every post, newest first. Equal timestamps fall back to id order so
    /// the listing is deterministic.
    pub fn list_posts(&self) -> Result<Vec<Post>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], row_to_post)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Posts by one author, same ordering as [`Database::list_posts`].
    pub fn list_posts_by_author(&self, author_id: &str) -> Result<Vec<Post>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE author_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![author_id], row_to_post)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Merge the fields present in `patch` and stamp `updated_at`.
    pub fn update_post(&self, id: PostId, patch: &PostPatch) -> Result<Post> {
        let encode = |list: &Option<Vec<String>>| list.as_deref().map(encode_list).transpose();

        let affected = self.conn().execute(
            "UPDATE posts SET
                 content                 = COALESCE(?2, content),
                 media_urls              = COALESCE(?3, media_urls),
                 design_disciplines      = COALESCE(?4, design_disciplines),
                 design_process          = COALESCE(?5, design_process),
                 tools                   = COALESCE(?6, tools),
                 learning_goals          = COALESCE(?7, learning_goals),
                 competition_involvement = COALESCE(?8, competition_involvement),
                 skill_level             = CASE WHEN ?10 THEN ?9 ELSE skill_level END,
                 updated_at              = ?11
             WHERE id = ?1",
            params![
                id.to_string(),
                patch.content,
                encode(&patch.media_urls)?,
                encode(&patch.design_disciplines)?,
                encode(&patch.design_process)?,
                encode(&patch.tools)?,
                encode(&patch.learning_goals)?,
                encode(&patch.competition_involvement)?,
                patch.skill_level.as_ref().and_then(|level| level.as_deref()),
                patch.skill_level.is_some(),
                format_ts(&now()),
            ],
        )?;

        if affected == 0 {
            return Err(StoreError::not_found("post", id));
        }
        self.get_post(id)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    // ON DELETE CASCADE: comments and likes go with it
    pub fn delete_post(&self, id: PostId) -> Result<()> {
        let affected = self
            .conn()
            .execute("DELETE FROM posts WHERE id = ?1", params![id.to_string()])?;
        if affected == 0 {
            return Err(StoreError::not_found("post", id));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` selected with `POST_COLUMNS` to a [`Post`].
fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let id_str: String = row.get(0)?;
    let likes: i64 = row.get(2)?;
    let created_str: String = row.get(13)?;
    let updated_str: Option<String> = row.get(14)?;

    let list = |idx: usize| -> rusqlite::Result<Vec<String>> {
        let raw: String = row.get(idx)?;
        parse_list(idx, &raw)
    };

    Ok(Post {
        id: PostId(parse_uuid(0, &id_str)?),
        content: row.get(1)?,
        like_count: likes.max(0) as u64,
        author_id: row.get(3)?,
        author_email: row.get(4)?,
        author_username: row.get(5)?,
        media_urls: list(6)?,
        tags: PostTags {
            design_disciplines: list(7)?,
            design_process: list(8)?,
            tools: list(9)?,
            learning_goals: list(10)?,
            competition_involvement: list(11)?,
            skill_level: row.get(12)?,
        },
        created_at: parse_ts(13, &created_str)?,
        updated_at: updated_str.map(|s| parse_ts(14, &s)).transpose()?,
    })
}
