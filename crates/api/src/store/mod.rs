//! Document persistence.
//!
//! # Collections
//!
//! - `trips` - Trips with their embedded places
//! - `stories` - Stories with their likes and comments
//! - `users` - User profiles, keyed by uid
//! - `destinations` - Recommendation catalogue
//!
//! # Contract
//!
//! A [`DocumentStore`] is a key-value document store keyed by collection and
//! document id. Documents are JSON objects with camelCase keys. Every `put`
//! stamps `createdAt` and `updatedAt`; every mutation stamps `updatedAt`.
//!
//! Services receive the store as an explicit dependency (`&dyn DocumentStore`
//! borrowed from `AppState`); there is no process-wide handle.
//!
//! # Backends
//!
//! - [`MemoryStore`] - in-process, used by default and in tests
//! - [`PgStore`] - `PostgreSQL` JSONB table, migrations in `crates/api/migrations/`

pub mod memory;
pub mod postgres;
mod query;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::{PgStore, create_pool};
pub use query::{Direction, Filter, FilterOp, OrderBy, Page, Query};

pub const TRIPS: &str = "trips";
pub const STORIES: &str = "stories";
pub const USERS: &str = "users";
pub const DESTINATIONS: &str = "destinations";

pub(crate) const ID_FIELD: &str = "id";
pub(crate) const CREATED_AT_FIELD: &str = "createdAt";
pub(crate) const UPDATED_AT_FIELD: &str = "updatedAt";

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document with this id exists in the collection.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// The query cannot be served (e.g. it would need a composite index).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A value could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored document does not have the expected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl StoreError {
    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_owned(),
            id: id.to_owned(),
        }
    }
}

/// A stored document: its id plus its fields (the id is also kept as the
/// `id` field so documents decode directly into entity types).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    /// Build a document from a JSON object, taking the id from its `id` field.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DataCorruption` if the value is not an object or
    /// has no string `id`.
    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        let Value::Object(data) = value else {
            return Err(StoreError::DataCorruption(
                "document is not a JSON object".to_owned(),
            ));
        };
        let id = data
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::DataCorruption("document has no id".to_owned()))?
            .to_owned();
        Ok(Self { id, data })
    }

    /// Serialize an entity into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not serialize to an object with an id.
    pub fn from_entity<T: Serialize>(entity: &T) -> Result<Self, StoreError> {
        Self::from_value(serde_json::to_value(entity)?)
    }

    /// Decode the document into an entity type.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DataCorruption` if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        let id = self.id;
        serde_json::from_value(Value::Object(self.data))
            .map_err(|e| StoreError::DataCorruption(format!("document {id}: {e}")))
    }

    /// Look up a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

/// Serialize a patch struct into the partial object passed to
/// [`DocumentStore::update`].
///
/// # Errors
///
/// Returns `StoreError::DataCorruption` if the patch is not a JSON object.
pub fn to_partial<T: Serialize>(patch: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(patch)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::DataCorruption(format!(
            "patch must serialize to an object, got {other}"
        ))),
    }
}

/// Key-value document store.
///
/// Each method is a single unit of work; implementations must not hold locks
/// across calls.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document.
    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError>;

    /// Insert or replace a document, stamping `createdAt` and `updatedAt`.
    /// Returns the document id.
    async fn put(&self, collection: &str, doc: Document) -> Result<String, StoreError>;

    /// Shallow-merge `partial` over the stored fields and stamp `updatedAt`.
    /// `id` and `createdAt` in the partial are ignored.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Delete a document. Fails with `NotFound` if it does not exist.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Run a filtered, ordered, cursor-paginated query.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Add `value` to the array `field` unless an equal element is already
    /// present, atomically, and stamp `updatedAt`.
    async fn add_to_set(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError>;

    /// Remove every element equal to `value` from the array `field`,
    /// atomically, and stamp `updatedAt`.
    async fn remove_from_set(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
