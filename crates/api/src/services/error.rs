//! Service error taxonomy.

use thiserror::Error;
use tripnest_core::AccessDenied;

use crate::store::StoreError;

/// Errors returned by the aggregate services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The addressed entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The requester does not own the resource.
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    /// The input violates a business rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation clashes with existing state (e.g. a duplicate place id).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store cannot serve the query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// An external provider failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Any other store failure.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, .. } => Self::NotFound(entity_name(&collection)),
            StoreError::InvalidQuery(msg) => Self::InvalidQuery(msg),
            other => Self::Store(other),
        }
    }
}

fn entity_name(collection: &str) -> String {
    match collection {
        crate::store::TRIPS => "trip",
        crate::store::STORIES => "story",
        crate::store::USERS => "profile",
        crate::store::DESTINATIONS => "destination",
        other => other,
    }
    .to_owned()
}
