use tracing::debug;

use hive_shared::PreferenceSet;
use hive_store::Post;

use super::Feed;
use crate::enrich::{enrich_posts, PostView};
use crate::error::ServerError;

impl Feed {
    /// Posts sharing at least one tag with the user's preferences, in feed
    /// order. Unknown users and users without preferences get an empty list.
    pub async fn recommended_posts(&self, user_id: &str) -> Result<Vec<PostView>, ServerError> {
        let Some(user) = self.directory.find_by_id(user_id).await? else {
            debug!(user_id, "recommendations for unknown user");
            return Ok(Vec::new());
        };

        let preferences = PreferenceSet::new(&user.preferences);
        if preferences.is_empty() {
            return Ok(Vec::new());
        }

        let posts = self.store.read(|db| db.list_posts()).await?;
        let matches: Vec<Post> = posts
            .into_iter()
            .filter(|p| preferences.matches(&p.tags))
            .collect();

        debug!(user_id, matched = matches.len(), "recommendations scored");
        enrich_posts(&self.directory, matches).await
    }
}
