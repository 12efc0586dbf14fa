//! Feed service: posts, comments, likes and recommendations.
//!
//! The service is split across files as `impl Feed` blocks:
//! - `posts.rs`     -- publish, list, search, patch, delete, like/unlike
//! - `comments.rs`  -- add, list, edit, delete
//! - `recommend.rs` -- tag-matched recommendations

mod comments;
mod posts;
mod recommend;

use std::sync::Arc;

use serde::Deserialize;

use crate::directory::AuthorDirectory;
use crate::error::ServerError;
use crate::notify::Notifier;
use crate::store::FeedStore;

#[derive(Clone)]
pub struct Feed {
    store: FeedStore,
    directory: AuthorDirectory,
    notifier: Arc<dyn Notifier>,
    like_retry_budget: u32,
}

impl Feed {
    pub fn new(
        store: FeedStore,
        directory: AuthorDirectory,
        notifier: Arc<dyn Notifier>,
        like_retry_budget: u32,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            like_retry_budget,
        }
    }
}

/// Body of `POST /posts/{id}/like` and `/unlike`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Liker {
    pub email: Option<String>,
    pub username: Option<String>,
}

/// Body of `POST /posts/{id}/comments`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewComment {
    pub email: Option<String>,
    pub username: Option<String>,
    pub text: Option<String>,
}

/// Body of `PUT /posts/{id}/comments/{commentId}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentEdit {
    pub text: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, ServerError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServerError::Validation(format!("{field} is required"))),
    }
}
