//! Local key-value storage.
//!
//! The notebook, its logical update timestamp and the sync settings live
//! under fixed keys. Anything that changes the notebook must write the
//! notebook and the timestamp in the same `set` call.

mod file_storage;
mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use file_storage::{FileStore, Result, StoreError, STORE_FILE};
pub use memory::MemoryStore;

pub const NOTEBOOK_KEY: &str = "notebook";
pub const NOTEBOOK_TIMESTAMP_KEY: &str = "notebook_update_timestamp";
pub const SYNC_SETTINGS_KEY: &str = "sync_settings";
pub const BACKUP_PRE_SYNC_KEY: &str = "notebook_backup_pre_sync";
pub const BACKUP_PRE_CLEANUP_KEY: &str = "notebook_backup_pre_cleanup";

#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Fetch the listed keys; absent keys are left out of the result.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    /// Write all items as one unit.
    async fn set(&self, items: Map<String, Value>) -> Result<()>;

    async fn get_one(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.get(&[key]).await?.remove(key))
    }
}

/// Read a millisecond timestamp out of a JSON value, tolerating floats.
/// Anything that is not a number reads as 0.
pub fn timestamp_from(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}
