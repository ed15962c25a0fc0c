//! Stories: public or private travel posts with likes and comments.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::patch::present;
use super::{CommentId, Coordinates, StoryId, Timestamp, UserId};
use crate::access::Owned;

/// A comment on a story. Comments keep arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    pub text: String,
    pub created_at: Timestamp,
}

/// A stored story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
    /// User ids that liked the story. A set, so a user counts at most once.
    #[serde(default)]
    pub likes: BTreeSet<UserId>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Story {
    #[must_use]
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    #[must_use]
    pub fn is_liked_by(&self, user_id: &UserId) -> bool {
        self.likes.contains(user_id)
    }

    #[must_use]
    pub fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }
}

impl Owned for Story {
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}

const fn default_public() -> bool {
    true
}

/// Result of toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub liked: bool,
    pub like_count: usize,
}

/// Fields a client supplies when publishing a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewStory {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

impl NewStory {
    /// Check the required text fields.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message if `title` or `content` is blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_owned());
        }
        if self.content.trim().is_empty() {
            return Err("content is required".to_owned());
        }
        Ok(())
    }
}

/// The updatable subset of a story.
///
/// `likes` and `comments` change only through their dedicated operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub coordinates: Option<Option<Coordinates>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl StoryPatch {
    /// Reject a patch that would blank a required text field.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message naming the blank field.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("title cannot be empty".to_owned());
        }
        if self.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err("content cannot be empty".to_owned());
        }
        Ok(())
    }
}
