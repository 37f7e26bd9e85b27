//! Key-value store contract and strategy selection
//!
//! [`KvStore`] is the one capability every strategy provides. Callers that do
//! not care which concurrency discipline backs the map hold an
//! `Arc<dyn KvStore<K, V>>` obtained from [`open`].

pub mod locked;

pub use locked::LockedStore;

use async_trait::async_trait;
use std::hash::Hash;
use std::sync::Arc;

use crate::actor::ActorStore;
use crate::config::{StoreConfig, Strategy};
use crate::error::Result;

/// Operations supported by every concurrent map implementation
///
/// Each call is linearizable on its own. Nothing is promised across two calls
/// from the same caller, so check-then-act sequences need outside
/// coordination.
#[async_trait]
pub trait KvStore<K, V>: Send + Sync {
    /// Current value for `key`, or [`StoreError::NotFound`](crate::StoreError::NotFound)
    async fn get(&self, key: &K) -> Result<V>;

    /// Insert or overwrite the value for `key`
    async fn set(&self, key: K, value: V) -> Result<()>;

    /// Remove `key` if present; removing an absent key is not an error
    async fn delete(&self, key: &K) -> Result<()>;

    /// Snapshot of the live keys, in no particular order
    async fn list_keys(&self) -> Result<Vec<K>>;
}

/// Build a store using the strategy named in `config`
///
/// Actor-backed strategies spawn their worker on the current Tokio runtime.
pub fn open<K, V>(config: &StoreConfig) -> Arc<dyn KvStore<K, V>>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    match config.strategy {
        Strategy::Locked => Arc::new(LockedStore::new()),
        Strategy::Actor | Strategy::Pooled => Arc::new(ActorStore::with_config(config)),
    }
}
