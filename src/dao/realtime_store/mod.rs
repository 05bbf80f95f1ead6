#[cfg(feature = "firebase-store")]
pub mod firebase;
mod memory;

pub use memory::MemoryRealtimeStore;

use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::watch;

use crate::dao::storage::{StorageError, StorageResult};

/// Path of the single shared timer record.
pub const TIMER_PATH: &str = "timer";
/// Parent path of every per-team overlay record.
pub const REGISTRATIONS_PATH: &str = "registrations";

/// Path of the overlay record of one team.
pub fn team_path(registration_id: &str) -> String {
    format!("{REGISTRATIONS_PATH}/{registration_id}")
}

/// Path-scoped key-value store with push subscriptions.
///
/// Paths are `/`-separated; writing `None` deletes the node. Writes are
/// last-write-wins except [`RealtimeStore::compare_and_swap`].
pub trait RealtimeStore: Send + Sync {
    /// Read the current value at `path`.
    fn read(&self, path: &str) -> BoxFuture<'static, StorageResult<Option<Value>>>;
    /// Replace the value at `path`.
    fn write(&self, path: &str, value: Option<Value>) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace the value at `path` only if it still equals `expected`.
    ///
    /// Returns `false` without writing when another writer got there first.
    fn compare_and_swap(
        &self,
        path: &str,
        expected: Option<Value>,
        value: Option<Value>,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Subscribe to the value at `path`; the receiver starts with the latest known value.
    fn subscribe(&self, path: &str) -> watch::Receiver<Option<Value>>;
    /// Cheap reachability probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Read and decode a typed record.
pub async fn read_typed<T>(store: &dyn RealtimeStore, path: &str) -> StorageResult<Option<T>>
where
    T: DeserializeOwned,
{
    match store.read(path).await? {
        Some(value) => decode(path, value).map(Some),
        None => Ok(None),
    }
}

/// Encode and write a typed record.
pub async fn write_typed<T>(store: &dyn RealtimeStore, path: &str, record: &T) -> StorageResult<()>
where
    T: Serialize,
{
    store.write(path, Some(encode(path, record)?)).await
}

/// Decode a raw value pushed by a subscription or returned by a read.
pub fn decode<T>(path: &str, value: Value) -> StorageResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(value)
        .map_err(|err| StorageError::malformed(format!("value at `{path}`: {err}")))
}

/// Encode a typed record into the store's JSON representation.
pub fn encode<T>(path: &str, record: &T) -> StorageResult<Value>
where
    T: Serialize,
{
    serde_json::to_value(record)
        .map_err(|err| StorageError::malformed(format!("value for `{path}`: {err}")))
}
