//! Spatial object store boundary.
//!
//! DESIGN
//! ======
//! The store owns the replicated `Component` collection, its subscription
//! list, and the sync engine. The crate only talks to it through
//! [`SubscriptionStore`], so a real sync SDK and the in-memory
//! [`crate::memory::MemoryStore`] are interchangeable.
//!
//! Sync completion is a future rather than a pair of callbacks; callers can
//! spawn it, race it, or drop it.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::ErrorCode;
use crate::predicate::AreaPredicate;
use crate::shape::Component;
use crate::subscription::{MutableSubscriptionSet, Subscription};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("subscription set rejected: {0}")]
    Rejected(String),
    #[error("store closed")]
    Closed,
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_STORE_NETWORK",
            Self::Unauthorized(_) => "E_STORE_UNAUTHORIZED",
            Self::Rejected(_) => "E_STORE_REJECTED",
            Self::Closed => "E_STORE_CLOSED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Resolves once the store has downloaded the data for the subscription set
/// that was current when it was requested.
pub type SyncFuture = BoxFuture<'static, Result<(), StoreError>>;

/// Subscription API of a partially-synced object store.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Locally available records matching `predicate`.
    async fn query(&self, predicate: &AreaPredicate) -> Result<Vec<Component>, StoreError>;

    /// Live subscriptions, oldest first.
    async fn list(&self) -> Result<Vec<Subscription>, StoreError>;

    /// Run `mutator` against a working copy and commit it as one write.
    ///
    /// Nothing is committed if this returns an error. On success, returns
    /// the committed list, oldest first.
    async fn atomic_update(
        &self,
        mutator: &mut (dyn for<'s> FnMut(&'s mut MutableSubscriptionSet) + Send),
    ) -> Result<Vec<Subscription>, StoreError>;

    /// One-shot notification for the current subscription set.
    fn wait_for_sync(&self) -> SyncFuture;
}
