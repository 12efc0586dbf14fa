//! Response view models: stored records plus the author's current profile.
//!
//! Enrichment only builds new values. Stored posts and comments are never
//! written back.

use serde::Serialize;

use hive_store::{Comment, Post, UserSummary};

use crate::directory::{AuthorDirectory, LookupKey};
use crate::error::ServerError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl From<&UserSummary> for AuthorView {
    fn from(user: &UserSummary) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub user: Option<AuthorView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: Option<AuthorView>,
}

/// Attach author profiles, keyed by `author_id`, to a list of posts.
pub async fn enrich_posts(
    directory: &AuthorDirectory,
    posts: Vec<Post>,
) -> Result<Vec<PostView>, ServerError> {
    let authors = directory
        .resolve(LookupKey::Id, posts.iter().map(|p| p.author_id.as_str()))
        .await?;

    Ok(posts
        .into_iter()
        .map(|post| {
            let user = authors.get(&post.author_id).map(AuthorView::from);
            PostView { post, user }
        })
        .collect())
}

/// Attach commenter profiles, keyed by `comment_email`.
pub async fn enrich_comments(
    directory: &AuthorDirectory,
    comments: Vec<Comment>,
) -> Result<Vec<CommentView>, ServerError> {
    let commenters = directory
        .resolve(
            LookupKey::Email,
            comments.iter().map(|c| c.comment_email.as_str()),
        )
        .await?;

    Ok(comments
        .into_iter()
        .map(|comment| {
            let user = commenters.get(&comment.comment_email).map(AuthorView::from);
            CommentView { comment, user }
        })
        .collect())
}
