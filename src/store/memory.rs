//! In-memory subscription store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Subscription, SubscriptionStore};
use crate::error::Result;

/// A store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    subscriptions: Mutex<BTreeMap<String, Subscription>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `subscriptions`.
    pub fn with_subscriptions(subscriptions: impl IntoIterator<Item = Subscription>) -> Self {
        let map = subscriptions
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();
        Self {
            subscriptions: Mutex::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.lock().is_empty()
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Subscription>> {
        Ok(self.subscriptions.lock().get(id).cloned())
    }

    async fn put(&self, subscription: Subscription) -> Result<()> {
        self.subscriptions
            .lock()
            .insert(subscription.id.clone(), subscription);
        Ok(())
    }

    async fn update(&self, subscription: Subscription) -> Result<bool> {
        let mut subscriptions = self.subscriptions.lock();
        match subscriptions.get_mut(&subscription.id) {
            Some(stored) => {
                *stored = subscription;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: &str) -> Result<Option<Subscription>> {
        Ok(self.subscriptions.lock().remove(id))
    }

    async fn list(&self) -> Result<Vec<Subscription>> {
        Ok(self.subscriptions.lock().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store
            .put(Subscription::new("1", "INT", "DR01", "28"))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);

        let sub = store.get("1").await.unwrap().unwrap();
        assert_eq!(sub.ticket, "28");

        let removed = store.remove("1").await.unwrap();
        assert!(removed.is_some());
        assert!(store.get("1").await.unwrap().is_none());
        assert!(store.remove("1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_by_id() {
        let store = MemoryStore::new();
        store
            .put(Subscription::new("1", "INT", "DR01", "28"))
            .await
            .unwrap();
        store
            .put(Subscription::new("1", "ANK", "DR07", "3"))
            .await
            .unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].unit_code, "ANK");
    }

    #[tokio::test]
    async fn test_update_never_inserts() {
        let store = MemoryStore::new();
        assert!(!store
            .update(Subscription::new("1", "INT", "DR01", "28"))
            .await
            .unwrap());
        assert!(store.is_empty());

        store
            .put(Subscription::new("1", "INT", "DR01", "28"))
            .await
            .unwrap();
        assert!(store
            .update(Subscription::new("1", "INT", "DR01", "29"))
            .await
            .unwrap());
        assert_eq!(store.get("1").await.unwrap().unwrap().ticket, "29");
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let store = MemoryStore::with_subscriptions(vec![
            Subscription::new("b", "INT", "DR01", "2"),
            Subscription::new("a", "INT", "DR01", "1"),
        ]);

        let ids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
