//! JSON file backed store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use tradereplay_protocols::error::StoreError;
use tradereplay_protocols::LocalStore;

const STORE_FILE: &str = "storage.json";

/// File holding the backend session, kept apart from the coordinator's
/// store so a CLI sign-in never races a running coordinator.
pub const SESSION_FILE: &str = "session.json";

/// File system store.
///
/// The key space is held in memory and written through on every mutation:
/// ```text
/// {data_dir}/
/// ├── storage.json
/// └── storage.json.tmp   (only during a write)
/// ```
///
/// Each file has a single writing process. A mutation only becomes visible
/// once it is on disk.
pub struct FileStore {
    path: PathBuf,
    values: RwLock<HashMap<String, Value>>,
}

impl FileStore {
    /// Open (or create) the coordinator store in `data_dir`.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_file(data_dir, STORE_FILE).await
    }

    /// Open (or create) `file_name` in `data_dir`.
    ///
    /// An unreadable or corrupt file is logged and replaced by an empty
    /// store rather than failing startup.
    pub async fn open_file(data_dir: impl AsRef<Path>, file_name: &str) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).await?;
        let path = data_dir.join(file_name);
        let values = Self::read(&path).await?;

        debug!("FileStore opened at {:?} with {} keys", path, values.len());

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pick up changes another process wrote to the file.
    pub async fn reload(&self) -> Result<(), StoreError> {
        let fresh = Self::read(&self.path).await?;
        *self.values.write().await = fresh;
        Ok(())
    }

    async fn read(path: &Path) -> Result<HashMap<String, Value>, StoreError> {
        match fs::read_to_string(path).await {
            Ok(content) => match serde_json::from_str::<HashMap<String, Value>>(&content) {
                Ok(values) => Ok(values),
                Err(e) => {
                    warn!("Discarding corrupt store file {:?}: {}", path, e);
                    Ok(HashMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the snapshot to a temp file and rename it over the store file.
    async fn persist(&self, snapshot: &HashMap<String, Value>) -> Result<(), StoreError> {
        let content = serde_json::to_string(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.write().await;
        let mut next = values.clone();
        next.insert(key.to_string(), value);
        self.persist(&next).await?;
        *values = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().await;
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.persist(&next).await?;
        *values = next;
        Ok(())
    }
}
