//! JSON-file subscription store.
//!
//! The whole store is one pretty-printed JSON array. Every mutation rewrites
//! the file through a temporary sibling and a rename, so a crash leaves
//! either the old or the new contents on disk.
//!
//! Several processes may share the file (a running `watch` and one-shot
//! `subscribe`/`unsubscribe` commands). Nothing is cached: reads load the
//! file, and writes reload it under an exclusive lock on `<file>.lock`
//! before applying their change.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use tokio::sync::Mutex;

use super::{Subscription, SubscriptionStore};
use crate::error::Result;

type Records = BTreeMap<String, Subscription>;

/// A store persisted to a JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    writer: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, checking any existing records.
    ///
    /// A missing or empty file is an empty store. Malformed JSON is an error.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let count = read_records(&path).await?.len();

        tracing::debug!(path = %path.display(), count, "opened subscription store");

        Ok(Self {
            lock_path: sibling(&path, ".lock"),
            path,
            writer: Mutex::new(()),
        })
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload the file and apply `change` while holding the write lock.
    ///
    /// `change` returns its result and whether the file must be rewritten.
    async fn modify<T>(&self, change: impl FnOnce(&mut Records) -> (T, bool)) -> Result<T> {
        let _writer = self.writer.lock().await;
        let _lock = self.lock_file().await?;

        let mut records = read_records(&self.path).await?;
        let (result, dirty) = change(&mut records);
        if dirty {
            self.persist(&records).await?;
        }
        Ok(result)
    }

    /// Take the cross-process lock. Released when the handle is dropped.
    async fn lock_file(&self) -> Result<std::fs::File> {
        create_parent(&self.path).await?;
        let lock_path = self.lock_path.clone();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(file)
    }

    async fn persist(&self, records: &Records) -> Result<()> {
        let records: Vec<&Subscription> = records.values().collect();
        let json = serde_json::to_string_pretty(&records)?;

        create_parent(&self.path).await?;
        let tmp = sibling(&self.path, ".tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

async fn read_records(path: &Path) -> Result<Records> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(content) => {
            let records: Vec<Subscription> = serde_json::from_str(&content)?;
            Ok(records.into_iter().map(|s| (s.id.clone(), s)).collect())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

async fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "subscriptions.json".into());
    name.push(suffix);
    path.with_file_name(name)
}

#[async_trait]
impl SubscriptionStore for FileStore {
    async fn get(&self, id: &str) -> Result<Option<Subscription>> {
        Ok(read_records(&self.path).await?.remove(id))
    }

    async fn put(&self, subscription: Subscription) -> Result<()> {
        self.modify(|records| {
            records.insert(subscription.id.clone(), subscription);
            ((), true)
        })
        .await
    }

    async fn update(&self, subscription: Subscription) -> Result<bool> {
        self.modify(|records| match records.get_mut(&subscription.id) {
            Some(stored) => {
                *stored = subscription;
                (true, true)
            }
            None => (false, false),
        })
        .await
    }

    async fn remove(&self, id: &str) -> Result<Option<Subscription>> {
        self.modify(|records| {
            let removed = records.remove(id);
            let dirty = removed.is_some();
            (removed, dirty)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Subscription>> {
        Ok(read_records(&self.path).await?.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antrian_types::{QueueEntry, QueueSnapshot};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("subscriptions.json"))
            .await
            .unwrap();

        assert!(store.list().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscriptions.json");

        let snapshot = QueueSnapshot::builder("INT", "DR01")
            .total_count(3)
            .current_number("1")
            .next(QueueEntry::pending("2"))
            .next(QueueEntry::checked_in("3"))
            .captured_at_ms(1_700_000_000_000)
            .build();
        let mut sub = Subscription::new("42", "INT", "DR01", "3")
            .with_labels(Some("Poli Penyakit Dalam".into()), None);
        sub.mark_notified(snapshot.clone(), 1_700_000_000_000);

        {
            let store = FileStore::open(&path).await.unwrap();
            store.put(sub.clone()).await.unwrap();
        }

        let store = FileStore::open(&path).await.unwrap();
        let loaded = store.get("42").await.unwrap().unwrap();
        assert_eq!(loaded, sub);
        assert_eq!(
            loaded.last_snapshot.unwrap().captured_at_ms,
            1_700_000_000_000
        );
    }

    #[tokio::test]
    async fn test_file_is_pretty_json_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscriptions.json");
        let store = FileStore::open(&path).await.unwrap();

        store
            .put(Subscription::new("b", "INT", "DR01", "2"))
            .await
            .unwrap();
        store
            .put(Subscription::new("a", "ANK", "DR07", "1"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with('['));
        assert!(content.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        let ids: Vec<_> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(!sibling(&path, ".tmp").exists());
    }

    #[tokio::test]
    async fn test_remove_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscriptions.json");

        let store = FileStore::open(&path).await.unwrap();
        store
            .put(Subscription::new("1", "INT", "DR01", "28"))
            .await
            .unwrap();
        assert!(store.remove("1").await.unwrap().is_some());
        assert!(store.remove("1").await.unwrap().is_none());

        let reopened = FileStore::open(&path).await.unwrap();
        assert!(reopened.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("subscriptions.json");

        let store = FileStore::open(&path).await.unwrap();
        store
            .put(Subscription::new("1", "INT", "DR01", "28"))
            .await
            .unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscriptions.json");
        std::fs::write(&path, "not valid json").unwrap();

        let err = FileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, crate::MonitorError::Serde(_)));
    }

    #[tokio::test]
    async fn test_stores_sharing_a_file_see_each_other() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscriptions.json");
        let watcher = FileStore::open(&path).await.unwrap();
        let cli = FileStore::open(&path).await.unwrap();

        watcher
            .put(Subscription::new("chat-1", "INT", "DR01", "28"))
            .await
            .unwrap();
        assert!(cli.get("chat-1").await.unwrap().is_some());

        assert!(cli.remove("chat-1").await.unwrap().is_some());
        assert!(watcher.get("chat-1").await.unwrap().is_none());

        let mut stale = Subscription::new("chat-1", "INT", "DR01", "28");
        stale.last_notified_at_ms = Some(1);
        assert!(!watcher.update(stale).await.unwrap());

        cli.put(Subscription::new("chat-2", "ANK", "DR07", "5"))
            .await
            .unwrap();
        watcher
            .put(Subscription::new("chat-3", "INT", "DR02", "9"))
            .await
            .unwrap();

        let reopened = FileStore::open(&path).await.unwrap();
        let ids: Vec<_> = reopened
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["chat-2", "chat-3"]);
    }

    #[tokio::test]
    async fn test_concurrent_writers_lose_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscriptions.json");
        let a = FileStore::open(&path).await.unwrap();
        let b = FileStore::open(&path).await.unwrap();

        let writes_a = async {
            for i in 0..10 {
                a.put(Subscription::new(format!("a-{i:02}"), "INT", "DR01", "1"))
                    .await
                    .unwrap();
            }
        };
        let writes_b = async {
            for i in 0..10 {
                b.put(Subscription::new(format!("b-{i:02}"), "INT", "DR01", "1"))
                    .await
                    .unwrap();
            }
        };
        tokio::join!(writes_a, writes_b);

        assert_eq!(a.list().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscriptions.json");
        std::fs::write(&path, "\n").unwrap();

        let store = FileStore::open(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
