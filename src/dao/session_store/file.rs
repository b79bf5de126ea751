use std::{collections::BTreeMap, io::ErrorKind, path::PathBuf, sync::Arc};

use futures::future::BoxFuture;
use tokio::{fs, sync::Mutex};
use tracing::debug;

use super::{Edit, KeyValueStore, SessionStoreError, StoreResult, StoredValue};

type Contents = BTreeMap<String, StoredValue>;

/// Store persisting every key into one JSON document.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// document, so a crash never leaves a truncated file behind.
#[derive(Clone)]
pub struct JsonFileStore {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    /// Open (lazily) the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Location of the backing document.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn load(&self) -> StoreResult<Contents> {
        match fs::read(self.path.as_path()).await {
            Ok(bytes) if bytes.is_empty() => Ok(Contents::new()),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| SessionStoreError::Corrupt {
                    path: self.path.to_path_buf(),
                    source,
                })
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Contents::new()),
            Err(source) => Err(SessionStoreError::Io {
                path: self.path.to_path_buf(),
                source,
            }),
        }
    }

    async fn persist(&self, contents: &Contents) -> StoreResult<()> {
        let io_error = |source: std::io::Error| SessionStoreError::Io {
            path: self.path.to_path_buf(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let bytes = serde_json::to_vec_pretty(contents).map_err(SessionStoreError::Encode)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await.map_err(io_error)?;
        fs::rename(&tmp, self.path.as_path())
            .await
            .map_err(io_error)?;
        debug!(path = %self.path.display(), keys = contents.len(), "session store written");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &'static str) -> BoxFuture<'static, StoreResult<Option<StoredValue>>> {
        let store = self.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            let mut contents = store.load().await?;
            Ok(contents.remove(key))
        })
    }

    fn edit(&self, edits: Vec<Edit>) -> BoxFuture<'static, StoreResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let _guard = store.lock.lock().await;
            let mut contents = store.load().await?;
            for edit in edits {
                match edit {
                    Edit::Put(key, value) => {
                        contents.insert(key.to_string(), value);
                    }
                    Edit::Remove(key) => {
                        contents.remove(key);
                    }
                }
            }
            store.persist(&contents).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::session_store::{LOGGED_IN_KEY, PLAYER_ID_KEY, PLAYER_NAME_KEY};

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("session.json"));
        assert_eq!(store.read(PLAYER_ID_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        JsonFileStore::new(&path)
            .edit(vec![
                Edit::Put(PLAYER_ID_KEY, StoredValue::Int(7)),
                Edit::Put(PLAYER_NAME_KEY, StoredValue::Text("mio".into())),
                Edit::Put(LOGGED_IN_KEY, StoredValue::Bool(true)),
            ])
            .await
            .unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.read(PLAYER_ID_KEY).await.unwrap(),
            Some(StoredValue::Int(7))
        );
        assert_eq!(
            reopened.read(PLAYER_NAME_KEY).await.unwrap(),
            Some(StoredValue::Text("mio".into()))
        );
        assert_eq!(
            reopened.read(LOGGED_IN_KEY).await.unwrap(),
            Some(StoredValue::Bool(true))
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"[1, 2").unwrap();

        let err = JsonFileStore::new(&path)
            .read(PLAYER_ID_KEY)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionStoreError::Corrupt { .. }));
    }
}
