use tracing::info;

use hive_shared::{CommentId, PostId};
use hive_store::Comment;

use super::{required, CommentEdit, Feed, NewComment};
use crate::enrich::{enrich_comments, CommentView};
use crate::error::ServerError;

impl Feed {
    /// The commenter's email must belong to a registered user; otherwise the
    /// request is rejected before anything is written.
    pub async fn add_comment(
        &self,
        post_id: PostId,
        request: NewComment,
    ) -> Result<Comment, ServerError> {
        let email = required(request.email, "email")?;
        let username = required(request.username, "username")?;
        let text = required(request.text, "text")?;

        if self.directory.find_by_email(&email).await?.is_none() {
            return Err(ServerError::Validation(format!(
                "no registered user with email {email}"
            )));
        }

        let comment = self
            .store
            .transact(move |db| db.add_comment(post_id, &email, &username, &text))
            .await?;
        info!(%post_id, comment_id = %comment.comment_id, "comment added");
        Ok(comment)
    }

    /// Oldest first, each with the commenter's current profile.
    pub async fn comments(&self, post_id: PostId) -> Result<Vec<CommentView>, ServerError> {
        let comments = self.store.read(move |db| db.list_comments(post_id)).await?;
        enrich_comments(&self.directory, comments).await
    }

    pub async fn edit_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
        edit: CommentEdit,
    ) -> Result<Comment, ServerError> {
        let text = required(edit.text, "text")?;
        let comment = self
            .store
            .transact(move |db| db.edit_comment(post_id, comment_id, &text))
            .await?;
        info!(%post_id, %comment_id, "comment edited");
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        post_id: PostId,
        comment_id: CommentId,
    ) -> Result<(), ServerError> {
        self.store
            .transact(move |db| db.delete_comment(post_id, comment_id))
            .await?;
        info!(%post_id, %comment_id, "comment deleted");
        Ok(())
    }
}
