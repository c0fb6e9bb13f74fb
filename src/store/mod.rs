//! Subscription persistence.
//!
//! The monitor reads and writes subscriptions only through
//! [`SubscriptionStore`]. Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: process-local, for tests and one-shot runs
//! - [`FileStore`]: a pretty-printed JSON array on disk

mod file;
mod memory;
mod subscription;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use subscription::Subscription;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Keyed storage for [`Subscription`] records.
#[async_trait]
pub trait SubscriptionStore: Send + Sync + Debug {
    /// Fetch one subscription.
    async fn get(&self, id: &str) -> Result<Option<Subscription>>;

    /// Insert or replace a subscription.
    async fn put(&self, subscription: Subscription) -> Result<()>;

    /// Replace a subscription only if it is still stored.
    ///
    /// Returns false, writing nothing, when the id is absent.
    async fn update(&self, subscription: Subscription) -> Result<bool>;

    /// Remove a subscription, returning it if it existed.
    async fn remove(&self, id: &str) -> Result<Option<Subscription>>;

    /// All subscriptions, ordered by id.
    async fn list(&self) -> Result<Vec<Subscription>>;
}

#[async_trait]
impl<S: SubscriptionStore + ?Sized> SubscriptionStore for Arc<S> {
    async fn get(&self, id: &str) -> Result<Option<Subscription>> {
        (**self).get(id).await
    }

    async fn put(&self, subscription: Subscription) -> Result<()> {
        (**self).put(subscription).await
    }

    async fn update(&self, subscription: Subscription) -> Result<bool> {
        (**self).update(subscription).await
    }

    async fn remove(&self, id: &str) -> Result<Option<Subscription>> {
        (**self).remove(id).await
    }

    async fn list(&self) -> Result<Vec<Subscription>> {
        (**self).list().await
    }
}
