use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use dashmap::DashMap;
use futures::future::{self, BoxFuture};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::watch;

use crate::dao::{
    realtime_store::RealtimeStore,
    storage::{StorageError, StorageResult},
};

#[derive(Debug, Error)]
#[error("in-memory realtime store is offline")]
struct Offline;

/// Process-local realtime store holding one JSON tree.
///
/// Used when no remote realtime database is configured and by every test that
/// needs several viewers sharing one store.
#[derive(Clone, Default)]
pub struct MemoryRealtimeStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    tree: Mutex<Value>,
    subscribers: DashMap<String, watch::Sender<Option<Value>>>,
    offline: AtomicBool,
    stalled: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryRealtimeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a network outage: every read and write fails until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Simulate a store that accepts writes and never answers. Reads still work.
    pub fn set_stalled(&self, stalled: bool) {
        self.inner.stalled.store(stalled, Ordering::SeqCst);
    }

    fn is_stalled(&self) -> bool {
        self.inner.stalled.load(Ordering::SeqCst)
    }

    /// Number of writes that actually changed the tree (including successful swaps).
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                "memory realtime store".into(),
                Offline,
            ))
        } else {
            Ok(())
        }
    }

    fn snapshot(&self, path: &str) -> Option<Value> {
        let tree = self.inner.tree.lock().unwrap_or_else(PoisonError::into_inner);
        get_at(&tree, &segments(path))
    }

    /// Apply `value` at `path` when `guard` accepts the current value, then notify subscribers.
    fn mutate(
        &self,
        path: &str,
        value: Option<Value>,
        guard: impl FnOnce(Option<&Value>) -> bool,
    ) -> StorageResult<bool> {
        self.ensure_online()?;
        let mut tree = self.inner.tree.lock().unwrap_or_else(PoisonError::into_inner);
        let parts = segments(path);
        let current = get_at(&tree, &parts);
        if !guard(current.as_ref()) {
            return Ok(false);
        }

        set_at(&mut tree, &parts, value);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);

        self.inner.subscribers.retain(|key, sender| {
            if sender.receiver_count() == 0 {
                return false;
            }
            let next = get_at(&tree, &segments(key));
            sender.send_if_modified(|slot| {
                if *slot != next {
                    *slot = next;
                    true
                } else {
                    false
                }
            });
            true
        });

        Ok(true)
    }
}

impl RealtimeStore for MemoryRealtimeStore {
    fn read(&self, path: &str) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let result = self.ensure_online().map(|()| self.snapshot(path));
        Box::pin(async move { result })
    }

    fn write(&self, path: &str, value: Option<Value>) -> BoxFuture<'static, StorageResult<()>> {
        if self.is_stalled() {
            return Box::pin(future::pending());
        }
        let result = self.mutate(path, value, |_| true).map(|_| ());
        Box::pin(async move { result })
    }

    fn compare_and_swap(
        &self,
        path: &str,
        expected: Option<Value>,
        value: Option<Value>,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        if self.is_stalled() {
            return Box::pin(future::pending());
        }
        let result = self.mutate(path, value, |current| current == expected.as_ref());
        Box::pin(async move { result })
    }

    fn subscribe(&self, path: &str) -> watch::Receiver<Option<Value>> {
        let key = segments(path).join("/");
        if let Some(sender) = self.inner.subscribers.get(&key) {
            return sender.subscribe();
        }
        let current = self.snapshot(path);
        self.inner
            .subscribers
            .entry(key)
            .or_insert_with(|| watch::channel(current).0)
            .subscribe()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.ensure_online();
        Box::pin(async move { result })
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}

fn get_at(node: &Value, parts: &[&str]) -> Option<Value> {
    let mut current = node;
    for part in parts {
        current = current.get(*part)?;
    }
    (!current.is_null()).then(|| current.clone())
}

/// Write `value` at `parts`, creating parents on the way and pruning empty ones on delete.
fn set_at(node: &mut Value, parts: &[&str], value: Option<Value>) {
    let Some((head, rest)) = parts.split_first() else {
        *node = value.unwrap_or(Value::Null);
        return;
    };

    if !node.is_object() {
        if value.is_none() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    if rest.is_empty() {
        match value {
            Some(value) if !value.is_null() => {
                map.insert((*head).to_string(), value);
            }
            _ => {
                map.remove(*head);
            }
        }
        return;
    }

    let prune = {
        let child = map.entry((*head).to_string()).or_insert(Value::Null);
        set_at(child, rest, value);
        child.is_null() || child.as_object().is_some_and(Map::is_empty)
    };
    if prune {
        map.remove(*head);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn nested_paths_are_readable_from_parents() {
        let store = MemoryRealtimeStore::new();
        store
            .write("registrations/HTF-1", Some(json!({ "checkedIn": true })))
            .await
            .unwrap();

        let parent = store.read("registrations").await.unwrap();
        assert_eq!(parent, Some(json!({ "HTF-1": { "checkedIn": true } })));
    }

    #[tokio::test]
    async fn deleting_a_leaf_prunes_empty_parents() {
        let store = MemoryRealtimeStore::new();
        store
            .write("registrations/HTF-1/assignedDomain", Some(json!("AI in Finance")))
            .await
            .unwrap();
        store
            .write("registrations/HTF-1/assignedDomain", None)
            .await
            .unwrap();

        assert_eq!(store.read("registrations").await.unwrap(), None);
    }

    #[tokio::test]
    async fn compare_and_swap_only_succeeds_once() {
        let store = MemoryRealtimeStore::new();
        store.write("timer", Some(json!({ "status": "A" }))).await.unwrap();

        let first = store
            .compare_and_swap(
                "timer",
                Some(json!({ "status": "A" })),
                Some(json!({ "status": "B" })),
            )
            .await
            .unwrap();
        let second = store
            .compare_and_swap(
                "timer",
                Some(json!({ "status": "A" })),
                Some(json!({ "status": "C" })),
            )
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        assert_eq!(store.read("timer").await.unwrap(), Some(json!({ "status": "B" })));
    }

    #[tokio::test]
    async fn subscribers_see_writes_below_their_path() {
        let store = MemoryRealtimeStore::new();
        let mut rx = store.subscribe("registrations/HTF-7");
        assert_eq!(*rx.borrow(), None);

        store
            .write("registrations/HTF-7/checkedIn", Some(json!(true)))
            .await
            .unwrap();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(json!({ "checkedIn": true })));
    }

    #[tokio::test]
    async fn offline_store_rejects_writes() {
        let store = MemoryRealtimeStore::new();
        store.set_offline(true);
        let err = store.write("timer", Some(json!({}))).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
        assert_eq!(store.write_count(), 0);
    }
}
