use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::Mutex;

use super::{Edit, KeyValueStore, StoreResult, StoredValue};

/// Volatile store, used by tests and when no session file is configured.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    values: Arc<DashMap<&'static str, StoredValue>>,
    edits: Arc<Mutex<()>>,
}

impl InMemoryKeyValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn read(&self, key: &'static str) -> BoxFuture<'static, StoreResult<Option<StoredValue>>> {
        let values = self.values.clone();
        let edits = self.edits.clone();
        Box::pin(async move {
            let _batch = edits.lock().await;
            Ok(values.get(key).map(|entry| entry.value().clone()))
        })
    }

    fn edit(&self, batch: Vec<Edit>) -> BoxFuture<'static, StoreResult<()>> {
        let values = self.values.clone();
        let edits = self.edits.clone();
        Box::pin(async move {
            let _batch = edits.lock().await;
            for edit in batch {
                match edit {
                    Edit::Put(key, value) => {
                        values.insert(key, value);
                    }
                    Edit::Remove(key) => {
                        values.remove(key);
                    }
                }
            }
            Ok(())
        })
    }
}
