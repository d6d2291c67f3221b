use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::Mutex;

use super::LocalStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Store file is corrupt: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Name of the JSON object file inside the data directory
pub const STORE_FILE: &str = "store.json";
/// Sidecar file carrying the cross-process write lock
const LOCK_FILE: &str = "store.lock";

/// Key-value store persisted as a single JSON object on disk.
///
/// Several processes may open the same directory. Each `set` takes an
/// exclusive lock on `store.lock`, re-reads the object, merges its keys and
/// replaces the file through a uniquely named temp file, so keys written
/// together land on disk together and concurrent writers never drop each
/// other's keys. Readers need no lock since the file is only ever replaced
/// by a rename.
pub struct FileStore {
    base_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("wordnest"))
            .ok_or(StoreError::DataDirNotFound)
    }

    /// Initialize storage directories
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_path)?;
        Ok(())
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    pub fn store_path(&self) -> PathBuf {
        self.base_path.join(STORE_FILE)
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        match tokio::fs::read_to_string(self.store_path()).await {
            Ok(content) => parse_store(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Read-merge-replace under the directory's write lock. Blocking.
fn merge_into_store(base_path: &Path, items: Map<String, Value>) -> Result<()> {
    std::fs::create_dir_all(base_path)?;

    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(base_path.join(LOCK_FILE))?;
    // Released when `lock_file` is closed
    lock_file.lock_exclusive()?;

    let path = base_path.join(STORE_FILE);
    let mut all = match std::fs::read_to_string(&path) {
        Ok(content) => parse_store(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
        Err(e) => return Err(e.into()),
    };
    all.extend(items);

    let mut tmp = NamedTempFile::new_in(base_path)?;
    serde_json::to_writer_pretty(&mut tmp, &all)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| e.error)?;

    drop(lock_file);
    Ok(())
}

fn parse_store(content: &str) -> Result<Map<String, Value>> {
    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(content)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Corrupt(format!(
            "expected a JSON object at the top level, found {}",
            json_kind(&other)
        ))),
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let mut all = self.read_all().await?;
        let mut found = Map::new();
        for key in keys {
            if let Some(value) = all.remove(*key) {
                found.insert((*key).to_string(), value);
            }
        }
        Ok(found)
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let keys: Vec<String> = items.keys().cloned().collect();
        let base_path = self.base_path.clone();
        tokio::task::spawn_blocking(move || merge_into_store(&base_path, items))
            .await
            .map_err(std::io::Error::other)??;

        log::debug!("FileStore: wrote keys {:?}", keys);
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
