//! Author directory: batched user lookups for enrichment.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;

use hive_store::UserSummary;

use crate::error::ServerError;
use crate::store::FeedStore;

/// Single-user lookup capability provided by the account service.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserSummary>, ServerError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserSummary>, ServerError>;
}

/// [`UserLookup`] backed by the `users` table.
pub struct StoreUserLookup {
    store: FeedStore,
}

impl StoreUserLookup {
    pub fn new(store: FeedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserLookup for StoreUserLookup {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserSummary>, ServerError> {
        let id = id.to_string();
        self.store.read(move |db| db.find_user_by_id(&id)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserSummary>, ServerError> {
        let email = email.to_string();
        self.store.read(move |db| db.find_user_by_email(&email)).await
    }
}

/// Which field the identifiers passed to [`AuthorDirectory::resolve`] name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey {
    Id,
    Email,
}

#[derive(Clone)]
pub struct AuthorDirectory {
    lookup: Arc<dyn UserLookup>,
}

impl AuthorDirectory {
    pub fn new(lookup: Arc<dyn UserLookup>) -> Self {
        Self { lookup }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserSummary>, ServerError> {
        self.lookup.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserSummary>, ServerError> {
        self.lookup.find_by_email(email).await
    }

    /// Resolve a batch of identifiers with one lookup per distinct value.
    ///
    /// Lookups run concurrently. Identifiers with no matching user are left
    /// out of the map; any lookup error fails the whole batch.
    pub async fn resolve<'a, I>(
        &self,
        key: LookupKey,
        identifiers: I,
    ) -> Result<HashMap<String, UserSummary>, ServerError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<&str> = identifiers
            .into_iter()
            .filter(|ident| !ident.is_empty())
            .collect();

        let lookups = unique.into_iter().map(|ident| async move {
            let found = match key {
                LookupKey::Id => self.lookup.find_by_id(ident).await?,
                LookupKey::Email => self.lookup.find_by_email(ident).await?,
            };
            Ok::<_, ServerError>(found.map(|user| (ident.to_string(), user)))
        });

        let resolved = try_join_all(lookups).await?;
        Ok(resolved.into_iter().flatten().collect())
    }
}
