mod client;
mod gzip;
#[cfg(test)]
pub(crate) mod memory;
#[cfg(test)]
pub(crate) mod test_server;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

pub use client::{WebDAVClient, WebDAVError};

use crate::sync::config::SyncCredentials;

/// Remote file store holding the snapshot and its metadata pointer.
///
/// Implementations never retry; every failure is returned to the caller.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Probe the base location. Never fails, unreachable is `false`.
    async fn check_connection(&self) -> bool;

    /// Create the sync directory if it is missing.
    async fn ensure_directory(&self) -> Result<(), WebDAVError>;

    /// Download and parse a file; `None` if it is absent or empty.
    /// Gzip payloads are recognised by their magic bytes.
    async fn get_file(&self, name: &str) -> Result<Option<Value>, WebDAVError>;

    /// Upload `payload` as gzip-compressed JSON.
    async fn put_file(&self, name: &str, payload: &Value) -> Result<(), WebDAVError>;

    /// Upload `payload` as plain JSON.
    async fn put_file_json(&self, name: &str, payload: &Value) -> Result<(), WebDAVError>;
}

/// Builds a remote for the settings read at the start of each sync attempt,
/// so edits to the server URL or credentials apply on the next attempt.
pub trait RemoteConnector: Send + Sync {
    fn connect(
        &self,
        server_url: &str,
        credentials: &SyncCredentials,
    ) -> Result<Arc<dyn RemoteStore>, WebDAVError>;
}

/// Connects to a WebDAV server, keeping all files in `base_dir`
pub struct WebDAVConnector {
    base_dir: String,
    connect_timeout: Duration,
}

impl WebDAVConnector {
    pub fn new(base_dir: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            base_dir: base_dir.into(),
            connect_timeout,
        }
    }
}

impl RemoteConnector for WebDAVConnector {
    fn connect(
        &self,
        server_url: &str,
        credentials: &SyncCredentials,
    ) -> Result<Arc<dyn RemoteStore>, WebDAVError> {
        let client = WebDAVClient::new(
            server_url,
            &self.base_dir,
            credentials,
            self.connect_timeout,
        )?;
        Ok(Arc::new(client))
    }
}
