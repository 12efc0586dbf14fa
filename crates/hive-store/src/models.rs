//! Domain model structs persisted in the SQLite database.
//!
//! Persisted records derive `Serialize` so they can be handed straight to the
//! HTTP layer; field names go over the wire in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use hive_shared::tags::null_as_empty;
use hive_shared::{CommentId, PostId, PostTags};

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A feed entry. Author fields are a snapshot taken when the post was
/// published and are not refreshed when the author edits their profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub content: String,
    /// Never negative; only ever moved by one per like/unlike.
    #[serde(rename = "likes")]
    pub like_count: u64,
    pub author_id: String,
    pub author_email: String,
    pub author_username: String,
    pub media_urls: Vec<String>,
    #[serde(flatten)]
    pub tags: PostTags,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Client-supplied fields of a new post. Anything the store assigns
/// (id, likes, timestamps) is ignored if present in the request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostDraft {
    pub content: String,
    pub author_id: String,
    pub author_email: String,
    pub author_username: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub media_urls: Vec<String>,
    #[serde(flatten)]
    pub tags: PostTags,
}

/// Partial update of a post's mutable fields. `None` leaves the stored
/// value untouched; a `null` list is treated the same as an absent one.
/// `skill_level` is the one nullable column: `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostPatch {
    pub content: Option<String>,
    pub media_urls: Option<Vec<String>>,
    pub design_disciplines: Option<Vec<String>>,
    pub design_process: Option<Vec<String>>,
    pub tools: Option<Vec<String>>,
    pub learning_goals: Option<Vec<String>>,
    pub competition_involvement: Option<Vec<String>>,
    #[serde(deserialize_with = "present")]
    pub skill_level: Option<Option<String>>,
}

/// Keeps an explicit `null` distinguishable from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A reply attached to exactly one post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: CommentId,
    pub post_id: PostId,
    pub comment_email: String,
    pub comment_user: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

/// Result of a like or unlike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeOutcome {
    /// Counter value after the operation.
    pub likes: u64,
    /// `false` when the ledger already reflected the request (repeat like,
    /// or unlike without a prior like) and nothing was written.
    pub applied: bool,
    pub author_id: String,
    pub author_email: String,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Read-only projection of an account, as needed by the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub username: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A message for a post author, e.g. "alice liked your post".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: String,
    pub recipient_email: String,
    pub post_id: PostId,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}
