//! Story aggregate service.
//!
//! Stories are owner-edited, but liking and commenting are open to any
//! authenticated user. Likes and comments go through the store's atomic set
//! operations so concurrent toggles from different users never lose updates.

use serde_json::Value;
use tracing::instrument;
use tripnest_core::{
    AccessDenied, Comment, CommentId, LikeStatus, NewStory, Story, StoryId, StoryPatch, Timestamp,
    UserId, assert_owner,
};

use super::ServiceError;
use crate::store::{
    Direction, Document, DocumentStore, FilterOp, Page, Query, STORIES, StoreError, to_partial,
};

const USER_ID: &str = "userId";
const IS_PUBLIC: &str = "isPublic";
const CREATED_AT: &str = "createdAt";
const LIKES: &str = "likes";
const COMMENTS: &str = "comments";

/// Page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: usize = 50;

/// Story CRUD, likes and comments.
pub struct StoryService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> StoryService<'a> {
    /// Create a new story service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    async fn load(&self, id: &StoryId) -> Result<Story, ServiceError> {
        Ok(self.store.get(STORIES, id.as_str()).await?.decode()?)
    }

    async fn load_owned(&self, id: &StoryId, requester: &UserId) -> Result<Story, ServiceError> {
        let story = self.load(id).await?;
        assert_owner(&story, requester)?;
        Ok(story)
    }

    fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ServiceError> {
        Ok(serde_json::to_value(value).map_err(StoreError::from)?)
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// One page of the public feed, newest first.
    ///
    /// `limit` defaults to 10 and is clamped to 1..=50. Pass the previous
    /// page's `next_cursor` to continue.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidQuery` if the cursor names a story that
    /// no longer exists.
    #[instrument(skip(self))]
    pub async fn list_public_stories(
        &self,
        limit: Option<usize>,
        cursor: Option<String>,
    ) -> Result<Page<Story>, ServiceError> {
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let query = Query::new()
            .filter(IS_PUBLIC, FilterOp::Eq, true)
            .order_by(CREATED_AT, Direction::Descending)
            .limit(limit)
            .start_after(cursor);

        let docs = self.store.query(STORIES, &query).await?;
        Ok(Page::from_documents(docs, limit).try_map(Document::decode)?)
    }

    /// All of a user's stories, public and private, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the query fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_user_stories(&self, user_id: &UserId) -> Result<Vec<Story>, ServiceError> {
        let query = Query::new()
            .filter(USER_ID, FilterOp::Eq, user_id.as_str())
            .order_by(CREATED_AT, Direction::Descending);

        let docs = self.store.query(STORIES, &query).await?;
        docs.into_iter()
            .map(|doc| doc.decode().map_err(ServiceError::from))
            .collect()
    }

    // =========================================================================
    // Stories
    // =========================================================================

    /// Fetch a story.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the story does not exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_story(&self, id: &StoryId) -> Result<Story, ServiceError> {
        self.load(id).await
    }

    /// Publish a story authored by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the title or content is blank.
    #[instrument(skip(self, new_story), fields(user_id = %user_id))]
    pub async fn create_story(
        &self,
        user_id: &UserId,
        new_story: NewStory,
    ) -> Result<Story, ServiceError> {
        new_story.validate().map_err(ServiceError::Validation)?;

        let now = Timestamp::now();
        let story = Story {
            id: StoryId::generate(),
            user_id: user_id.clone(),
            title: new_story.title.trim().to_owned(),
            content: new_story.content,
            image_url: new_story.image_url,
            coordinates: new_story.coordinates,
            location: new_story.location,
            is_public: new_story.is_public,
            likes: std::collections::BTreeSet::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let id = self
            .store
            .put(STORIES, Document::from_entity(&story)?)
            .await?;
        tracing::info!(story_id = %id, "Story created");
        self.load(&StoryId::new(id)).await
    }

    /// Merge `patch` into a story the requester owns.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for non-owners.
    #[instrument(skip(self, patch), fields(id = %id, requester = %requester))]
    pub async fn update_story(
        &self,
        id: &StoryId,
        requester: &UserId,
        patch: StoryPatch,
    ) -> Result<Story, ServiceError> {
        patch.validate().map_err(ServiceError::Validation)?;
        self.load_owned(id, requester).await?;

        let doc = self
            .store
            .update(STORIES, id.as_str(), to_partial(&patch)?)
            .await?;
        Ok(doc.decode()?)
    }

    /// Delete a story the requester owns.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if it does not exist,
    /// `ServiceError::Forbidden` for non-owners.
    #[instrument(skip(self), fields(id = %id, requester = %requester))]
    pub async fn delete_story(&self, id: &StoryId, requester: &UserId) -> Result<(), ServiceError> {
        self.load_owned(id, requester).await?;
        self.store.delete(STORIES, id.as_str()).await?;
        tracing::info!("Story deleted");
        Ok(())
    }

    // =========================================================================
    // Likes & comments
    // =========================================================================

    /// Flip `user_id`'s like on a story.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the story does not exist.
    #[instrument(skip(self), fields(id = %id, user_id = %user_id))]
    pub async fn toggle_like(
        &self,
        id: &StoryId,
        user_id: &UserId,
    ) -> Result<LikeStatus, ServiceError> {
        let story = self.load(id).await?;
        let member = Value::String(user_id.to_string());

        let doc = if story.is_liked_by(user_id) {
            self.store
                .remove_from_set(STORIES, id.as_str(), LIKES, member)
                .await?
        } else {
            self.store
                .add_to_set(STORIES, id.as_str(), LIKES, member)
                .await?
        };

        let story: Story = doc.decode()?;
        Ok(LikeStatus {
            liked: story.is_liked_by(user_id),
            like_count: story.like_count(),
        })
    }

    /// Append a comment.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if `text` is blank,
    /// `ServiceError::NotFound` if the story does not exist.
    #[instrument(skip(self, text), fields(id = %id, user_id = %user_id))]
    pub async fn add_comment(
        &self,
        id: &StoryId,
        user_id: &UserId,
        text: &str,
    ) -> Result<Comment, ServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation("comment text is required".to_owned()));
        }

        let comment = Comment {
            id: CommentId::generate(),
            user_id: user_id.clone(),
            text: text.to_owned(),
            created_at: Timestamp::now(),
        };
        self.store
            .add_to_set(STORIES, id.as_str(), COMMENTS, Self::to_json(&comment)?)
            .await?;
        Ok(comment)
    }

    /// Remove a comment. Allowed for the comment's author and the story's owner.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the story or comment does not
    /// exist, `ServiceError::Forbidden` for anyone else.
    #[instrument(skip(self), fields(id = %id, comment_id = %comment_id, requester = %requester))]
    pub async fn delete_comment(
        &self,
        id: &StoryId,
        comment_id: &CommentId,
        requester: &UserId,
    ) -> Result<(), ServiceError> {
        let story = self.load(id).await?;
        let comment = story
            .comment(comment_id)
            .ok_or_else(|| ServiceError::NotFound("comment".to_owned()))?;

        if &comment.user_id != requester && &story.user_id != requester {
            return Err(AccessDenied {
                requester: requester.clone(),
            }
            .into());
        }

        self.store
            .remove_from_set(STORIES, id.as_str(), COMMENTS, Self::to_json(comment)?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::store::MemoryStore;

    fn new_story(title: &str, is_public: bool) -> NewStory {
        NewStory {
            title: title.to_owned(),
            content: "Went there, loved it.".to_owned(),
            image_url: None,
            coordinates: None,
            location: "Lisbon".to_owned(),
            is_public,
        }
    }

    #[tokio::test]
    async fn test_create_starts_without_likes_or_comments() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);

        let story = service
            .create_story(&UserId::new("u1"), new_story("Trams", true))
            .await
            .unwrap();
        assert!(story.likes.is_empty());
        assert!(story.comments.is_empty());
        assert!(story.is_public);
    }

    #[tokio::test]
    async fn test_create_requires_content() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);

        let mut input = new_story("Trams", true);
        input.content = "  ".to_owned();
        let err = service
            .create_story(&UserId::new("u1"), input)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_then_delete_again_is_not_found() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);
        let author = UserId::new("u1");
        let story = service
            .create_story(&author, new_story("Trams", true))
            .await
            .unwrap();

        service.delete_story(&story.id, &author).await.unwrap();
        let err = service.delete_story(&story.id, &author).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(matches!(
            service.get_story(&story.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_like_then_unlike() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);
        let story = service
            .create_story(&UserId::new("u2"), new_story("Tiles", true))
            .await
            .unwrap();
        let u3 = UserId::new("u3");

        let status = service.toggle_like(&story.id, &u3).await.unwrap();
        assert_eq!(
            status,
            LikeStatus {
                liked: true,
                like_count: 1
            }
        );

        let status = service.toggle_like(&story.id, &u3).await.unwrap();
        assert_eq!(
            status,
            LikeStatus {
                liked: false,
                like_count: 0
            }
        );
        assert!(service.get_story(&story.id).await.unwrap().likes.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_likes_from_different_users_commute() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);
        let story = service
            .create_story(&UserId::new("u1"), new_story("Porto", true))
            .await
            .unwrap();

        let (a, b, c) = (UserId::new("fan1"), UserId::new("fan2"), UserId::new("fan3"));
        let (ra, rb, rc) = tokio::join!(
            service.toggle_like(&story.id, &a),
            service.toggle_like(&story.id, &b),
            service.toggle_like(&story.id, &c),
        );
        assert!(ra.unwrap().liked && rb.unwrap().liked && rc.unwrap().liked);

        assert_eq!(service.get_story(&story.id).await.unwrap().like_count(), 3);
    }

    #[tokio::test]
    async fn test_comment_is_trimmed_and_blank_rejected() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);
        let story = service
            .create_story(&UserId::new("u1"), new_story("Sintra", true))
            .await
            .unwrap();

        let comment = service
            .add_comment(&story.id, &UserId::new("u2"), "  Beautiful!  ")
            .await
            .unwrap();
        assert_eq!(comment.text, "Beautiful!");

        let err = service
            .add_comment(&story.id, &UserId::new("u2"), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let stored = service.get_story(&story.id).await.unwrap();
        assert_eq!(stored.comments, vec![comment]);
    }

    #[tokio::test]
    async fn test_comment_on_missing_story_is_not_found() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);
        let err = service
            .add_comment(&StoryId::new("missing"), &UserId::new("u2"), "Hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_comment_permissions() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);
        let owner = UserId::new("owner");
        let author = UserId::new("author");
        let stranger = UserId::new("stranger");
        let story = service
            .create_story(&owner, new_story("Evora", true))
            .await
            .unwrap();

        let first = service.add_comment(&story.id, &author, "One").await.unwrap();
        let second = service.add_comment(&story.id, &author, "Two").await.unwrap();

        let err = service
            .delete_comment(&story.id, &first.id, &stranger)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        service
            .delete_comment(&story.id, &first.id, &author)
            .await
            .unwrap();
        service
            .delete_comment(&story.id, &second.id, &owner)
            .await
            .unwrap();
        assert!(service.get_story(&story.id).await.unwrap().comments.is_empty());

        let err = service
            .delete_comment(&story.id, &first.id, &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_edit_or_delete() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);
        let story = service
            .create_story(&UserId::new("u1"), new_story("Faro", true))
            .await
            .unwrap();
        let other = UserId::new("u2");

        let patch = StoryPatch {
            is_public: Some(false),
            ..StoryPatch::default()
        };
        let err = service
            .update_story(&story.id, &other, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = service.delete_story(&story.id, &other).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert_eq!(service.get_story(&story.id).await.unwrap(), story);
    }

    #[tokio::test]
    async fn test_public_feed_pagination_visits_each_story_once() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);

        let mut public = HashSet::new();
        for i in 0..23 {
            let story = service
                .create_story(&UserId::new("u1"), new_story(&format!("Public {i}"), true))
                .await
                .unwrap();
            public.insert(story.id);
        }
        for i in 0..4 {
            service
                .create_story(&UserId::new("u1"), new_story(&format!("Private {i}"), false))
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = service.list_public_stories(Some(10), cursor).await.unwrap();
            seen.extend(page.items.iter().map(|s| s.id.clone()));
            if !page.has_more {
                break;
            }
            cursor = page.next_cursor;
        }

        assert_eq!(seen.len(), 23);
        let unique: HashSet<StoryId> = seen.into_iter().collect();
        assert_eq!(unique, public);
    }

    #[tokio::test]
    async fn test_limit_is_clamped() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);
        for i in 0..3 {
            service
                .create_story(&UserId::new("u1"), new_story(&format!("S{i}"), true))
                .await
                .unwrap();
        }

        let page = service.list_public_stories(Some(0), None).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_user_stories_include_private() {
        let store = MemoryStore::new();
        let service = StoryService::new(&store);
        let user = UserId::new("u1");
        service.create_story(&user, new_story("A", true)).await.unwrap();
        service.create_story(&user, new_story("B", false)).await.unwrap();
        service
            .create_story(&UserId::new("u2"), new_story("C", true))
            .await
            .unwrap();

        let stories = service.list_user_stories(&user).await.unwrap();
        assert_eq!(stories.len(), 2);
    }
}
