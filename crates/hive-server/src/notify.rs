//! Fire-and-forget notifications to post authors.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use hive_shared::PostId;
use hive_store::{LikeOutcome, Notification};

use crate::store::FeedStore;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> anyhow::Result<()>;
}

/// Persists notifications in the `notifications` table.
pub struct StoreNotifier {
    store: FeedStore,
}

impl StoreNotifier {
    pub fn new(store: FeedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Notifier for StoreNotifier {
    async fn notify(&self, notification: Notification) -> anyhow::Result<()> {
        self.store
            .transact(move |db| db.insert_notification(&notification))
            .await?;
        Ok(())
    }
}

pub fn like_notification(post_id: PostId, outcome: &LikeOutcome, liker: &str) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        recipient_id: outcome.author_id.clone(),
        recipient_email: outcome.author_email.clone(),
        post_id,
        message: format!("{liker} liked your post"),
        created_at: Utc::now(),
        read: false,
    }
}

/// Deliver on a background task. Failures are logged and dropped.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) -> JoinHandle<()> {
    tokio::spawn(async move {
        let post_id = notification.post_id;
        let recipient = notification.recipient_id.clone();
        match notifier.notify(notification).await {
            Ok(()) => tracing::debug!(%post_id, %recipient, "like notification sent"),
            Err(e) => tracing::warn!(%post_id, %recipient, error = %e, "like notification failed"),
        }
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every notification it receives.
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(notification);
            Ok(())
        }
    }

    /// Always fails.
    pub struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _notification: Notification) -> anyhow::Result<()> {
            anyhow::bail!("notification service offline")
        }
    }
}
