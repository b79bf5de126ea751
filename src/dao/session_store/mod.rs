//! Persisted key-value storage for the session identity.

mod error;
mod file;
mod memory;

pub use error::{SessionStoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::InMemoryKeyValueStore;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Key holding the logged-in participant id.
pub const PLAYER_ID_KEY: &str = "player_id";
/// Key holding the logged-in participant name.
pub const PLAYER_NAME_KEY: &str = "player_name";
/// Key holding the logged-in flag.
pub const LOGGED_IN_KEY: &str = "is_logged_in";

/// Value persisted under a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    /// Integer value.
    Int(i64),
    /// Flag.
    Bool(bool),
    /// Text value.
    Text(String),
}

impl StoredValue {
    /// Integer payload, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StoredValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Boolean payload, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StoredValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Text payload, if this is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StoredValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// One change inside a batched [`KeyValueStore::edit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Write a value under a key.
    Put(&'static str, StoredValue),
    /// Delete a key.
    Remove(&'static str),
}

/// Asynchronous key-value store keeping the session identity across restarts.
///
/// An `edit` batch is applied as a whole: readers never observe half of it.
pub trait KeyValueStore: Send + Sync {
    /// Value under `key`, if any.
    fn read(&self, key: &'static str) -> BoxFuture<'static, StoreResult<Option<StoredValue>>>;
    /// Apply a batch of edits atomically.
    fn edit(&self, edits: Vec<Edit>) -> BoxFuture<'static, StoreResult<()>>;
}
