use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::KvStore;
use crate::error::{Result, StoreError};

/// In-memory key-value store guarded by a single reader/writer lock
///
/// Every operation runs on the calling task. `get` and `list_keys` share the
/// lock with other readers; `set` and `delete` hold it exclusively.
#[derive(Debug)]
pub struct LockedStore<K, V> {
    data: RwLock<HashMap<K, V>>,
}

impl<K, V> LockedStore<K, V>
where
    K: Eq + Hash,
{
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A writer that panicked mid-call cannot leave the map half-updated,
    // so a poisoned lock still guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, V>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, V>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> Default for LockedStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> KvStore<K, V> for LockedStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Result<V> {
        self.read().get(key).cloned().ok_or(StoreError::NotFound)
    }

    async fn set(&self, key: K, value: V) -> Result<()> {
        self.write().insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &K) -> Result<()> {
        self.write().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<K>> {
        let data = self.read();
        Ok(data.keys().cloned().collect())
    }
}
