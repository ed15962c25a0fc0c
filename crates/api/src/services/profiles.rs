//! User profiles.
//!
//! A profile document is keyed by uid and created lazily the first time its
//! owner fetches it. Trip and story counters are recomputed on every read.

use tracing::instrument;
use tripnest_core::{ProfilePatch, ProfileStats, Timestamp, UserId, UserProfile};

use super::ServiceError;
use super::auth::Identity;
use crate::store::{
    Document, DocumentStore, FilterOp, Query, STORIES, StoreError, TRIPS, USERS, to_partial,
};

/// Profile reads and edits.
pub struct ProfileService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProfileService<'a> {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    async fn count_owned(&self, collection: &str, uid: &UserId) -> Result<u64, ServiceError> {
        let query = Query::new().filter("userId", FilterOp::Eq, uid.as_str());
        let docs = self.store.query(collection, &query).await?;
        Ok(u64::try_from(docs.len()).unwrap_or(u64::MAX))
    }

    async fn with_stats(&self, mut profile: UserProfile) -> Result<UserProfile, ServiceError> {
        profile.stats = ProfileStats {
            trips_count: self.count_owned(TRIPS, &profile.uid).await?,
            stories_count: self.count_owned(STORIES, &profile.uid).await?,
            ..profile.stats
        };
        Ok(profile)
    }

    /// The caller's profile, created from the identity claims if missing.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the store fails.
    #[instrument(skip(self, identity), fields(uid = %identity.uid))]
    pub async fn get_or_create_profile(
        &self,
        identity: &Identity,
    ) -> Result<UserProfile, ServiceError> {
        let profile = match self.store.get(USERS, identity.uid.as_str()).await {
            Ok(doc) => doc.decode()?,
            Err(StoreError::NotFound { .. }) => self.create(identity).await?,
            Err(e) => return Err(e.into()),
        };
        self.with_stats(profile).await
    }

    async fn create(&self, identity: &Identity) -> Result<UserProfile, ServiceError> {
        let email = identity.email.clone().unwrap_or_default();
        let display_name = identity.name.clone().unwrap_or_else(|| {
            email
                .split_once('@')
                .map_or_else(String::new, |(local, _)| local.to_owned())
        });

        let now = Timestamp::now();
        let profile = UserProfile {
            uid: identity.uid.clone(),
            email,
            display_name,
            photo_url: identity.picture.clone().unwrap_or_default(),
            bio: String::new(),
            location: String::new(),
            stats: ProfileStats::default(),
            created_at: now,
            updated_at: now,
        };

        let mut data = to_partial(&profile)?;
        data.insert("id".to_owned(), profile.uid.as_str().into());
        let doc = Document {
            id: profile.uid.to_string(),
            data,
        };

        self.store.put(USERS, doc).await?;
        tracing::info!("Profile created");
        Ok(self.store.get(USERS, profile.uid.as_str()).await?.decode()?)
    }

    /// Someone's public profile.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user has no profile.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn get_profile(&self, uid: &UserId) -> Result<UserProfile, ServiceError> {
        let profile = self.store.get(USERS, uid.as_str()).await?.decode()?;
        self.with_stats(profile).await
    }

    /// Apply an allow-listed patch to the caller's own profile.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the store fails.
    #[instrument(skip(self, identity, patch), fields(uid = %identity.uid))]
    pub async fn update_profile(
        &self,
        identity: &Identity,
        patch: ProfilePatch,
    ) -> Result<UserProfile, ServiceError> {
        self.get_or_create_profile(identity).await?;

        let profile = self
            .store
            .update(USERS, identity.uid.as_str(), to_partial(&patch)?)
            .await?
            .decode()?;
        self.with_stats(profile).await
    }
}
