use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{LocalStore, Result};

/// In-process store, used by tests and by embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given keys
    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    /// Copy of everything currently stored
    pub fn dump(&self) -> Map<String, Value> {
        self.values.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let values = self.values.lock().unwrap();
        Ok(keys
            .iter()
            .filter_map(|key| values.get(*key).map(|v| ((*key).to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        self.values.lock().unwrap().extend(items);
        Ok(())
    }
}
