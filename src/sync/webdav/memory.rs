//! In-memory `RemoteStore` with I/O counters for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Semaphore;

use super::{RemoteStore, WebDAVError};

#[derive(Default)]
pub struct MemoryRemote {
    files: Mutex<HashMap<String, Value>>,
    failing_puts: Mutex<HashSet<String>>,
    failing_gets: Mutex<HashSet<String>>,
    read_gate: Mutex<Option<Arc<Semaphore>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, value: Value) {
        self.files.lock().unwrap().insert(name.to_string(), value);
    }

    pub fn file(&self, name: &str) -> Option<Value> {
        self.files.lock().unwrap().get(name).cloned()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_put(&self, name: &str) {
        self.failing_puts.lock().unwrap().insert(name.to_string());
    }

    pub fn fail_get(&self, name: &str) {
        self.failing_gets.lock().unwrap().insert(name.to_string());
    }

    /// Park every read until `release_reads` is called
    pub fn hold_reads(&self) {
        *self.read_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_reads(&self) {
        if let Some(gate) = self.read_gate.lock().unwrap().take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn check_connection(&self) -> bool {
        true
    }

    async fn ensure_directory(&self) -> Result<(), WebDAVError> {
        Ok(())
    }

    async fn get_file(&self, name: &str) -> Result<Option<Value>, WebDAVError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let gate = self.read_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        if self.failing_gets.lock().unwrap().contains(name) {
            return Err(WebDAVError::Server {
                status: 500,
                message: format!("{} unavailable", name),
            });
        }
        Ok(self.files.lock().unwrap().get(name).cloned())
    }

    async fn put_file(&self, name: &str, payload: &Value) -> Result<(), WebDAVError> {
        self.put_file_json(name, payload).await
    }

    async fn put_file_json(&self, name: &str, payload: &Value) -> Result<(), WebDAVError> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if self.failing_puts.lock().unwrap().contains(name) {
            return Err(WebDAVError::Server {
                status: 503,
                message: format!("{} rejected", name),
            });
        }
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), payload.clone());
        Ok(())
    }
}
