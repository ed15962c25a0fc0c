//! Ownership guard.
//!
//! Every owner-only mutation (edit, delete, place changes) calls
//! [`assert_owner`] on the freshly loaded document before writing. Liking and
//! commenting are open to any authenticated user and skip the guard.

use thiserror::Error;

use crate::types::UserId;

/// A document with a single owning user.
pub trait Owned {
    fn owner(&self) -> &UserId;
}

/// The requester does not own the resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("user {requester} does not own this resource")]
pub struct AccessDenied {
    pub requester: UserId,
}

/// Fail unless `requester` owns `resource`.
///
/// # Errors
///
/// Returns `AccessDenied` when the owner differs from the requester.
pub fn assert_owner<R: Owned + ?Sized>(resource: &R, requester: &UserId) -> Result<(), AccessDenied> {
    if resource.owner() == requester {
        Ok(())
    } else {
        Err(AccessDenied {
            requester: requester.clone(),
        })
    }
}
