use std::sync::Arc;

use tracing::info;

use hive_shared::PostId;
use hive_store::{Post, PostDraft, PostPatch};

use super::{required, Feed, Liker};
use crate::enrich::{enrich_posts, PostView};
use crate::error::ServerError;
use crate::notify;

impl Feed {
    // ------------------------------------------------------------------
    // Publish / read
    // ------------------------------------------------------------------

    /// Tag values are free text and stored verbatim.
    pub async fn create_post(&self, draft: PostDraft) -> Result<Post, ServerError> {
        let post = self.store.transact(move |db| db.create_post(draft)).await?;
        info!(post_id = %post.id, author = %post.author_id, "post published");
        Ok(post)
    }

    pub async fn all_posts(&self) -> Result<Vec<PostView>, ServerError> {
        let posts = self.store.read(|db| db.list_posts()).await?;
        enrich_posts(&self.directory, posts).await
    }

    pub async fn posts_by_author(&self, author_id: &str) -> Result<Vec<PostView>, ServerError> {
        let author = author_id.to_string();
        let posts = self
            .store
            .read(move |db| db.list_posts_by_author(&author))
            .await?;
        enrich_posts(&self.directory, posts).await
    }

    /// Case-insensitive substring match on `content` over the whole feed.
    pub async fn search_posts(&self, keyword: &str) -> Result<Vec<PostView>, ServerError> {
        let needle = keyword.to_lowercase();
        let posts = self.store.read(|db| db.list_posts()).await?;
        let hits: Vec<Post> = posts
            .into_iter()
            .filter(|p| p.content.to_lowercase().contains(&needle))
            .collect();
        enrich_posts(&self.directory, hits).await
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub async fn update_post(&self, post_id: PostId, patch: PostPatch) -> Result<Post, ServerError> {
        let post = self
            .store
            .transact(move |db| db.update_post(post_id, &patch))
            .await?;
        info!(%post_id, "post updated");
        Ok(post)
    }

    pub async fn delete_post(&self, post_id: PostId) -> Result<(), ServerError> {
        self.store.transact(move |db| db.delete_post(post_id)).await?;
        info!(%post_id, "post deleted");
        Ok(())
    }

    /// Returns the counter after the like. The author is notified in the
    /// background unless the like was a repeat or a self-like.
    pub async fn like_post(&self, post_id: PostId, liker: Liker) -> Result<u64, ServerError> {
        let email = required(liker.email, "email")?;
        let username = required(liker.username, "username")?;

        let budget = self.like_retry_budget;
        let liker_email = email.clone();
        let outcome = self
            .store
            .transact(move |db| db.like_post(post_id, &liker_email, budget))
            .await?;

        info!(%post_id, likes = outcome.likes, applied = outcome.applied, "post liked");

        if outcome.applied && !outcome.author_email.eq_ignore_ascii_case(&email) {
            let notification = notify::like_notification(post_id, &outcome, &username);
            notify::dispatch(Arc::clone(&self.notifier), notification);
        }
        Ok(outcome.likes)
    }

    pub async fn unlike_post(&self, post_id: PostId, liker: Liker) -> Result<u64, ServerError> {
        let email = required(liker.email, "email")?;
        let budget = self.like_retry_budget;
        let outcome = self
            .store
            .transact(move |db| db.unlike_post(post_id, &email, budget))
            .await?;

        info!(%post_id, likes = outcome.likes, applied = outcome.applied, "post unliked");
        Ok(outcome.likes)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::future::join_all;
    use hive_shared::PostTags;

    use super::*;
    use crate::directory::testing::user;
    use crate::feed::testing::{in_memory_feed, in_memory_feed_with};
    use crate::notify::testing::FailingNotifier;

    fn draft(author: &str, content: &str) -> PostDraft {
        PostDraft {
            content: content.into(),
            author_id: author.into(),
            author_email: format!("{author}@example.com"),
            author_username: author.into(),
            ..Default::default()
        }
    }

    fn liker(email: &str, username: &str) -> Liker {
        Liker {
            email: Some(email.into()),
            username: Some(username.into()),
        }
    }

    #[tokio::test]
    async fn like_then_unlike_round_trip() {
        let (feed, _, _) = in_memory_feed();
        let post = feed.create_post(draft("author", "hello")).await.unwrap();

        let likes = feed
            .like_post(post.id, liker("a@example.com", "alice"))
            .await
            .unwrap();
        assert_eq!(likes, 1);

        let likes = feed
            .unlike_post(post.id, liker("a@example.com", "alice"))
            .await
            .unwrap();
        assert_eq!(likes, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_likes_are_all_counted() {
        let (feed, store, _) = in_memory_feed();
        let post = feed.create_post(draft("author", "popular")).await.unwrap();

        let likes = (0..25).map(|i| {
            let feed = feed.clone();
            async move {
                feed.like_post(post.id, liker(&format!("fan{i}@example.com"), "fan"))
                    .await
            }
        });
        for result in join_all(likes).await {
            result.unwrap();
        }

        let stored = store.read(move |db| db.get_post(post.id)).await.unwrap();
        assert_eq!(stored.like_count, 25);
    }

    #[tokio::test]
    async fn like_notifies_author_once() {
        let (feed, _, notifier) = in_memory_feed();
        let post = feed.create_post(draft("author", "notify me")).await.unwrap();

        feed.like_post(post.id, liker("a@example.com", "alice"))
            .await
            .unwrap();
        feed.like_post(post.id, liker("a@example.com", "alice"))
            .await
            .unwrap();

        for _ in 0..50 {
            if !notifier.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        // Give a stray second notification a chance to show up.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let sent = notifier.sent();

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message, "alice liked your post");
        assert_eq!(sent[0].recipient_id, "author");
    }

    #[tokio::test]
    async fn like_without_username_is_rejected() {
        let (feed, store, _) = in_memory_feed();
        let post = feed.create_post(draft("author", "hello")).await.unwrap();

        let err = feed
            .like_post(
                post.id,
                Liker {
                    email: Some("a@example.com".into()),
                    username: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::Validation(_)));
        let likes = store.read(move |db| db.count_likes(post.id)).await.unwrap();
        assert_eq!(likes, 0);
    }

    #[tokio::test]
    async fn self_like_does_not_notify() {
        let (feed, _, notifier) = in_memory_feed();
        let post = feed.create_post(draft("author", "me")).await.unwrap();

        let likes = feed
            .like_post(post.id, liker("author@example.com", "author"))
            .await
            .unwrap();
        assert_eq!(likes, 1);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn failing_notifier_does_not_fail_like() {
        let (feed, _) = in_memory_feed_with(Arc::new(FailingNotifier));
        let post = feed.create_post(draft("author", "quiet")).await.unwrap();

        let likes = feed
            .like_post(post.id, liker("a@example.com", "alice"))
            .await
            .unwrap();
        assert_eq!(likes, 1);
    }

    #[tokio::test]
    async fn like_requires_email_and_existing_post() {
        let (feed, _, _) = in_memory_feed();
        let err = feed
            .like_post(PostId::new(), Liker::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));

        let err = feed
            .like_post(PostId::new(), liker("a@example.com", "alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_on_content() {
        let (feed, _, _) = in_memory_feed();
        feed.create_post(draft("u1", "DesignHive rocks")).await.unwrap();
        feed.create_post(draft("u1", "No match here")).await.unwrap();

        let hits = feed.search_posts("hive").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].post.content, "DesignHive rocks");
    }

    #[tokio::test]
    async fn listings_are_enriched_and_newest_first() {
        let (feed, store, _) = in_memory_feed();
        store
            .transact(|db| db.upsert_user(&user("u1", &[])))
            .await
            .unwrap();
        for i in 0..3 {
            feed.create_post(draft("u1", &format!("post {i}"))).await.unwrap();
        }
        feed.create_post(draft("u2", "other author")).await.unwrap();

        let all = feed.all_posts().await.unwrap();
        assert_eq!(all.len(), 4);
        for pair in all.windows(2) {
            assert!(pair[0].post.created_at >= pair[1].post.created_at);
        }

        let mine = feed.posts_by_author("u1").await.unwrap();
        assert_eq!(mine.len(), 3);
        assert!(mine.iter().all(|v| {
            v.user.as_ref().and_then(|u| u.avatar_url.as_deref())
                == Some("https://cdn.example.com/u1.png")
        }));
    }

    #[tokio::test]
    async fn patch_then_delete() {
        let (feed, _, _) = in_memory_feed();
        let mut initial = draft("u1", "v1");
        initial.tags = PostTags {
            tools: vec!["Figma".into()],
            ..Default::default()
        };
        let post = feed.create_post(initial).await.unwrap();

        let patched = feed
            .update_post(
                post.id,
                PostPatch {
                    content: Some("v2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.content, "v2");
        assert_eq!(patched.tags.tools, vec!["Figma".to_string()]);

        feed.delete_post(post.id).await.unwrap();
        assert!(matches!(
            feed.delete_post(post.id).await.unwrap_err(),
            ServerError::NotFound(_)
        ));
    }
}
