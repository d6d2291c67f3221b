use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::storage::{
    timestamp_from, LocalStore, StoreError, BACKUP_PRE_SYNC_KEY, NOTEBOOK_KEY,
    NOTEBOOK_TIMESTAMP_KEY, SYNC_SETTINGS_KEY,
};

use super::config::{
    RemoteMeta, Snapshot, SyncSettings, SyncStatus, DATA_FILE_NAME, META_FILE_NAME,
};
use super::notify::{Notifier, SurfaceEvent};
use super::webdav::{RemoteConnector, RemoteStore, WebDAVError};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Connectivity(#[from] WebDAVError),
    #[error("unexpected data: {0}")]
    DataShape(String),
    #[error("local store error: {0}")]
    Store(#[from] StoreError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What a comparison of logical timestamps calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Push,
    Pull,
    UpToDate,
}

/// Why an attempt returned without doing anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InProgress,
    Disabled,
}

/// Result of one call to [`SyncManager::sync`]
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Pushed { timestamp: i64 },
    Pulled { timestamp: i64, old_count: usize, new_count: usize },
    UpToDate { timestamp: i64 },
    Skipped(SkipReason),
    Failed(String),
}

/// Two-replica last-writer-wins. A remote with no timestamp at all is
/// bootstrapped from any local data.
pub fn decide(local_ts: i64, remote_ts: i64) -> SyncAction {
    if remote_ts == 0 && local_ts > 0 {
        SyncAction::Push
    } else if local_ts > remote_ts {
        SyncAction::Push
    } else if local_ts < remote_ts {
        SyncAction::Pull
    } else {
        SyncAction::UpToDate
    }
}

/// Local notebook as read at the start of an attempt
struct LocalState {
    timestamp: i64,
    /// Raw stored value, `None` when the key was never written
    raw_notebook: Option<Value>,
    notebook: Vec<Value>,
}

/// Holds the in-progress flag for the lifetime of one attempt
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Coordinates whole-snapshot sync between the local store and one remote
pub struct SyncManager {
    store: Arc<dyn LocalStore>,
    connector: Arc<dyn RemoteConnector>,
    notifier: Arc<dyn Notifier>,
    syncing: AtomicBool,
}

impl SyncManager {
    pub fn new(
        store: Arc<dyn LocalStore>,
        connector: Arc<dyn RemoteConnector>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            connector,
            notifier,
            syncing: AtomicBool::new(false),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Run one sync attempt.
    ///
    /// Overlapping calls return `Skipped(InProgress)` without touching the
    /// network. Without `force`, a disabled configuration is skipped as well.
    /// Every other outcome, failures included, is recorded in the stored
    /// sync settings.
    pub async fn sync(&self, force: bool) -> SyncOutcome {
        let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
            log::info!("Sync: already in progress, skipping");
            return SyncOutcome::Skipped(SkipReason::InProgress);
        };

        // Unreadable settings are not a disabled configuration; the attempt
        // fails and the error is recorded like any other.
        let settings = self.load_settings().await;
        if let Ok(settings) = &settings {
            if !force && !settings.as_ref().is_some_and(|s| s.enabled) {
                log::debug!("Sync: disabled, skipping");
                return SyncOutcome::Skipped(SkipReason::Disabled);
            }
        }

        let result = match settings {
            Ok(settings) => self.run(settings.as_ref()).await,
            Err(e) => Err(e),
        };

        let status = match &result {
            Ok(_) => SyncStatus::Success,
            Err(e) => {
                log::error!("Sync: failed: {}", e);
                SyncStatus::Error(e.to_string())
            }
        };
        if let Err(e) = self.record_status(&status).await {
            log::error!("Sync: could not record status '{}': {}", status, e);
        }

        match result {
            Ok(outcome) => outcome,
            Err(e) => SyncOutcome::Failed(e.to_string()),
        }
    }

    /// Probe the server described by `settings` without syncing
    pub async fn test_connection(&self, settings: &SyncSettings) -> Result<bool, SyncError> {
        let credentials = settings.validate().map_err(SyncError::Config)?;
        let remote = self.connector.connect(&settings.server_url, &credentials)?;
        Ok(remote.check_connection().await)
    }

    pub async fn load_settings(&self) -> Result<Option<SyncSettings>, SyncError> {
        match self.store.get_one(SYNC_SETTINGS_KEY).await? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| SyncError::Config(format!("invalid sync settings: {}", e))),
        }
    }

    async fn run(&self, settings: Option<&SyncSettings>) -> Result<SyncOutcome, SyncError> {
        let settings =
            settings.ok_or_else(|| SyncError::Config("sync settings not found".to_string()))?;
        let credentials = settings.validate().map_err(SyncError::Config)?;
        let remote = self.connector.connect(&settings.server_url, &credentials)?;

        let local = self.load_local().await?;
        let remote_ts = self.remote_timestamp(remote.as_ref()).await?;

        log::info!(
            "Sync: local ts={}, remote ts={}",
            local.timestamp,
            remote_ts
        );

        match decide(local.timestamp, remote_ts) {
            SyncAction::Push => self.push(remote.as_ref(), local).await,
            SyncAction::Pull => self.pull(remote.as_ref(), local).await,
            SyncAction::UpToDate => {
                log::info!("Sync: already up to date");
                Ok(SyncOutcome::UpToDate {
                    timestamp: local.timestamp,
                })
            }
        }
    }

    async fn load_local(&self) -> Result<LocalState, SyncError> {
        let mut values = self
            .store
            .get(&[NOTEBOOK_KEY, NOTEBOOK_TIMESTAMP_KEY])
            .await?;

        let timestamp = timestamp_from(values.get(NOTEBOOK_TIMESTAMP_KEY));
        let raw_notebook = values.remove(NOTEBOOK_KEY).filter(|v| !v.is_null());
        let notebook = match &raw_notebook {
            None => Vec::new(),
            Some(Value::Array(entries)) => entries.clone(),
            Some(_) => {
                return Err(SyncError::DataShape(
                    "local notebook is not an array".to_string(),
                ))
            }
        };

        Ok(LocalState {
            timestamp,
            raw_notebook,
            notebook,
        })
    }

    /// Read the remote timestamp from `meta.json`, falling back to the
    /// snapshot itself when the pointer is missing, unreadable, or zero.
    async fn remote_timestamp(&self, remote: &dyn RemoteStore) -> Result<i64, SyncError> {
        let meta = match remote.get_file(META_FILE_NAME).await {
            Ok(value) => value.as_ref().and_then(RemoteMeta::from_json),
            Err(e) => {
                log::warn!("Sync: {} unreadable, checking full snapshot: {}", META_FILE_NAME, e);
                None
            }
        };

        if let Some(meta) = meta {
            return Ok(meta.update_timestamp);
        }

        let snapshot = remote.get_file(DATA_FILE_NAME).await?;
        Ok(snapshot
            .as_ref()
            .map(|s| timestamp_from(s.get("update_timestamp")))
            .unwrap_or(0))
    }

    /// Upload the snapshot, then its metadata pointer. The two writes are
    /// independent; a failure between them leaves the pointer behind the
    /// data until the next push.
    async fn push(&self, remote: &dyn RemoteStore, local: LocalState) -> Result<SyncOutcome, SyncError> {
        log::info!(
            "Sync: pushing {} entries (ts={})",
            local.notebook.len(),
            local.timestamp
        );

        let timestamp = local.timestamp;
        let snapshot = Snapshot {
            update_timestamp: timestamp,
            notebook: local.notebook,
        };
        remote.put_file(DATA_FILE_NAME, &snapshot.to_json()).await?;

        let meta = RemoteMeta {
            update_timestamp: timestamp,
        };
        remote.put_file_json(META_FILE_NAME, &meta.to_json()).await?;

        Ok(SyncOutcome::Pushed { timestamp })
    }

    /// Replace the local notebook with the remote snapshot, keeping a copy
    /// of the old one under the backup key.
    async fn pull(&self, remote: &dyn RemoteStore, local: LocalState) -> Result<SyncOutcome, SyncError> {
        let value = remote.get_file(DATA_FILE_NAME).await?.ok_or_else(|| {
            SyncError::DataShape(format!(
                "remote reports a newer version but {} is missing",
                DATA_FILE_NAME
            ))
        })?;
        let snapshot = Snapshot::from_json(value).map_err(SyncError::DataShape)?;

        // Decide on the snapshot's own timestamp, not on the pointer
        if snapshot.update_timestamp <= local.timestamp {
            return Err(SyncError::DataShape(format!(
                "remote metadata is ahead of its snapshot (snapshot ts={}, local ts={})",
                snapshot.update_timestamp, local.timestamp
            )));
        }

        let old_count = local.notebook.len();
        let new_count = snapshot.notebook.len();
        log::info!(
            "Sync: pulling {} entries (ts={}), replacing {} local entries",
            new_count,
            snapshot.update_timestamp,
            old_count
        );

        if let Some(previous) = local.raw_notebook {
            let mut backup = Map::new();
            backup.insert(BACKUP_PRE_SYNC_KEY.to_string(), previous);
            self.store.set(backup).await?;
        }

        let mut items = Map::new();
        items.insert(NOTEBOOK_KEY.to_string(), Value::Array(snapshot.notebook));
        items.insert(
            NOTEBOOK_TIMESTAMP_KEY.to_string(),
            Value::from(snapshot.update_timestamp),
        );
        self.store.set(items).await?;

        self.notifier.notify_all(SurfaceEvent::SyncCompleted {
            old_count,
            new_count,
        });

        Ok(SyncOutcome::Pulled {
            timestamp: snapshot.update_timestamp,
            old_count,
            new_count,
        })
    }

    /// Write the outcome onto the settings as they are now, so edits made
    /// while the attempt ran survive.
    async fn record_status(&self, status: &SyncStatus) -> Result<(), SyncError> {
        let Some(Value::Object(mut settings)) = self.store.get_one(SYNC_SETTINGS_KEY).await? else {
            return Ok(());
        };
        status.record_on(&mut settings, Utc::now());

        let mut items = Map::new();
        items.insert(SYNC_SETTINGS_KEY.to_string(), Value::Object(settings));
        self.store.set(items).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::sync::config::SyncCredentials;
    use crate::sync::notify::BroadcastNotifier;
    use crate::sync::webdav::memory::MemoryRemote;
    use serde_json::json;

    struct FixedRemote(Arc<MemoryRemote>);

    impl RemoteConnector for FixedRemote {
        fn connect(
            &self,
            _server_url: &str,
            _credentials: &SyncCredentials,
        ) -> Result<Arc<dyn RemoteStore>, WebDAVError> {
            Ok(self.0.clone())
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        remote: Arc<MemoryRemote>,
        notifier: Arc<BroadcastNotifier>,
        manager: Arc<SyncManager>,
    }

    fn word(text: &str) -> Value {
        json!({ "id": format!("id-{}", text), "text": text, "contexts": [] })
    }

    fn enabled_settings() -> Value {
        json!({
            "enabled": true,
            "server_url": "https://dav.example.com/dav/",
            "username": "reader",
            "password": "secret",
            "auto_sync_interval_min": 30
        })
    }

    fn harness(settings: Value, local_ts: Option<i64>, notebook: Option<Value>) -> Harness {
        let mut values = Map::new();
        values.insert(SYNC_SETTINGS_KEY.to_string(), settings);
        if let Some(ts) = local_ts {
            values.insert(NOTEBOOK_TIMESTAMP_KEY.to_string(), json!(ts));
        }
        if let Some(notebook) = notebook {
            values.insert(NOTEBOOK_KEY.to_string(), notebook);
        }

        let store = Arc::new(MemoryStore::with_values(values));
        let remote = Arc::new(MemoryRemote::new());
        let notifier = Arc::new(BroadcastNotifier::new());
        let manager = Arc::new(SyncManager::new(
            store.clone(),
            Arc::new(FixedRemote(remote.clone())),
            notifier.clone(),
        ));

        Harness {
            store,
            remote,
            notifier,
            manager,
        }
    }

    fn seed_remote(remote: &MemoryRemote, ts: i64, notebook: Value) {
        remote.insert(DATA_FILE_NAME, json!({ "update_timestamp": ts, "notebook": notebook }));
        remote.insert(META_FILE_NAME, json!({ "update_timestamp": ts }));
    }

    fn stored_status(store: &MemoryStore) -> Option<String> {
        store.dump()[SYNC_SETTINGS_KEY]
            .get("last_sync_status")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    #[test]
    fn test_decide() {
        assert_eq!(decide(100, 0), SyncAction::Push);
        assert_eq!(decide(100, 50), SyncAction::Push);
        assert_eq!(decide(50, 100), SyncAction::Pull);
        assert_eq!(decide(100, 100), SyncAction::UpToDate);
        assert_eq!(decide(0, 0), SyncAction::UpToDate);
    }

    #[tokio::test]
    async fn test_push_when_local_is_newer() {
        let local = json!([word("alpha"), word("beta")]);
        let h = harness(enabled_settings(), Some(100), Some(local.clone()));
        seed_remote(&h.remote, 50, json!([word("stale")]));

        let outcome = h.manager.sync(false).await;

        assert_eq!(outcome, SyncOutcome::Pushed { timestamp: 100 });
        assert_eq!(h.remote.file(META_FILE_NAME), Some(json!({ "update_timestamp": 100 })));
        let snapshot = h.remote.file(DATA_FILE_NAME).unwrap();
        assert_eq!(snapshot["notebook"], local);
        assert_eq!(snapshot["update_timestamp"], json!(100));
        assert_eq!(stored_status(&h.store).as_deref(), Some("success"));
    }

    #[tokio::test]
    async fn test_bootstrap_empty_remote() {
        let h = harness(enabled_settings(), Some(100), Some(json!([word("alpha")])));

        let outcome = h.manager.sync(false).await;

        assert_eq!(outcome, SyncOutcome::Pushed { timestamp: 100 });
        assert_eq!(h.remote.file(META_FILE_NAME), Some(json!({ "update_timestamp": 100 })));
        assert_eq!(h.remote.writes(), 2);
    }

    #[tokio::test]
    async fn test_pull_when_remote_is_newer() {
        let old_local = json!([word("old")]);
        let h = harness(enabled_settings(), Some(50), Some(old_local.clone()));
        seed_remote(&h.remote, 100, json!([word("wordA")]));
        let mut events = h.notifier.subscribe();

        let outcome = h.manager.sync(false).await;

        assert_eq!(
            outcome,
            SyncOutcome::Pulled {
                timestamp: 100,
                old_count: 1,
                new_count: 1
            }
        );
        let values = h.store.dump();
        assert_eq!(values[NOTEBOOK_KEY], json!([word("wordA")]));
        assert_eq!(values[NOTEBOOK_TIMESTAMP_KEY], json!(100));
        assert_eq!(values[BACKUP_PRE_SYNC_KEY], old_local);
        assert_eq!(h.remote.writes(), 0);
        assert_eq!(
            events.try_recv().unwrap(),
            SurfaceEvent::SyncCompleted {
                old_count: 1,
                new_count: 1
            }
        );
    }

    #[tokio::test]
    async fn test_pull_into_empty_local_skips_backup() {
        let h = harness(enabled_settings(), None, None);
        seed_remote(&h.remote, 100, json!([word("wordA"), word("wordB")]));

        let outcome = h.manager.sync(false).await;

        assert!(matches!(outcome, SyncOutcome::Pulled { new_count: 2, .. }));
        assert!(!h.store.dump().contains_key(BACKUP_PRE_SYNC_KEY));
    }

    #[tokio::test]
    async fn test_equal_timestamps_are_idempotent() {
        let h = harness(enabled_settings(), Some(100), Some(json!([word("alpha")])));
        seed_remote(&h.remote, 100, json!([word("alpha")]));

        for _ in 0..3 {
            assert_eq!(h.manager.sync(false).await, SyncOutcome::UpToDate { timestamp: 100 });
            assert_eq!(stored_status(&h.store).as_deref(), Some("success"));
        }
        assert_eq!(h.remote.writes(), 0);
    }

    #[tokio::test]
    async fn test_disabled_without_force_does_nothing() {
        let mut settings = enabled_settings();
        settings["enabled"] = json!(false);
        let h = harness(settings.clone(), Some(100), Some(json!([])));

        let outcome = h.manager.sync(false).await;

        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::Disabled));
        assert_eq!(h.remote.reads(), 0);
        assert_eq!(h.remote.writes(), 0);
        assert_eq!(h.store.dump()[SYNC_SETTINGS_KEY], settings);
    }

    #[tokio::test]
    async fn test_force_bypasses_enabled_flag() {
        let mut settings = enabled_settings();
        settings["enabled"] = json!(false);
        let h = harness(settings, Some(100), Some(json!([word("alpha")])));

        let outcome = h.manager.sync(true).await;

        assert_eq!(outcome, SyncOutcome::Pushed { timestamp: 100 });
        assert_eq!(stored_status(&h.store).as_deref(), Some("success"));
    }

    #[tokio::test]
    async fn test_missing_username_is_a_config_error() {
        let mut settings = enabled_settings();
        settings["username"] = json!("  ");
        let h = harness(settings, Some(100), Some(json!([])));

        let outcome = h.manager.sync(false).await;

        assert!(matches!(outcome, SyncOutcome::Failed(ref m) if m.contains("username")));
        assert_eq!(h.remote.reads(), 0);
        let status = stored_status(&h.store).unwrap();
        assert!(status.starts_with("error: configuration error"), "{}", status);
        assert!(h.store.dump()[SYNC_SETTINGS_KEY].get("last_sync_time").is_some());
    }

    #[tokio::test]
    async fn test_unreadable_settings_record_a_config_error() {
        let mut settings = enabled_settings();
        settings["enabled"] = json!("yes");
        let h = harness(settings, Some(100), Some(json!([])));

        let outcome = h.manager.sync(false).await;

        assert!(matches!(outcome, SyncOutcome::Failed(ref m) if m.contains("invalid sync settings")));
        assert_eq!(h.remote.reads(), 0);
        let status = stored_status(&h.store).unwrap();
        assert!(status.starts_with("error: configuration error"), "{}", status);
        assert_eq!(h.store.dump()[SYNC_SETTINGS_KEY]["enabled"], json!("yes"));
    }

    #[tokio::test]
    async fn test_forced_sync_without_settings_fails_quietly() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(MemoryRemote::new());
        let manager = SyncManager::new(
            store.clone(),
            Arc::new(FixedRemote(remote.clone())),
            Arc::new(BroadcastNotifier::new()),
        );

        let outcome = manager.sync(true).await;

        assert!(matches!(outcome, SyncOutcome::Failed(ref m) if m.contains("not found")));
        assert!(store.dump().is_empty());
        assert_eq!(remote.reads(), 0);
    }

    #[tokio::test]
    async fn test_overlapping_sync_is_dropped() {
        let h = harness(enabled_settings(), Some(100), Some(json!([word("alpha")])));
        h.remote.hold_reads();

        let first = tokio::spawn({
            let manager = h.manager.clone();
            async move { manager.sync(false).await }
        });
        while h.remote.reads() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(h.manager.is_syncing());

        let second = h.manager.sync(false).await;
        assert_eq!(second, SyncOutcome::Skipped(SkipReason::InProgress));
        assert_eq!(h.remote.reads(), 1);

        h.remote.release_reads();
        assert_eq!(first.await.unwrap(), SyncOutcome::Pushed { timestamp: 100 });
        assert!(!h.manager.is_syncing());
        assert_eq!(h.remote.writes(), 2);
    }

    #[tokio::test]
    async fn test_missing_meta_falls_back_to_snapshot() {
        let h = harness(enabled_settings(), Some(50), Some(json!([])));
        h.remote.insert(
            DATA_FILE_NAME,
            json!({ "update_timestamp": 100, "notebook": [word("wordA")] }),
        );

        let outcome = h.manager.sync(false).await;

        assert!(matches!(outcome, SyncOutcome::Pulled { timestamp: 100, .. }));
    }

    #[tokio::test]
    async fn test_unreadable_meta_falls_back_to_snapshot() {
        let h = harness(enabled_settings(), Some(100), Some(json!([])));
        seed_remote(&h.remote, 100, json!([]));
        h.remote.fail_get(META_FILE_NAME);

        assert_eq!(h.manager.sync(false).await, SyncOutcome::UpToDate { timestamp: 100 });
    }

    #[tokio::test]
    async fn test_malformed_remote_snapshot_leaves_local_untouched() {
        let local = json!([word("keep")]);
        let h = harness(enabled_settings(), Some(50), Some(local.clone()));
        h.remote.insert(META_FILE_NAME, json!({ "update_timestamp": 100 }));
        h.remote.insert(DATA_FILE_NAME, json!({ "update_timestamp": 100 }));

        let outcome = h.manager.sync(false).await;

        assert!(matches!(outcome, SyncOutcome::Failed(ref m) if m.contains("notebook array")));
        let values = h.store.dump();
        assert_eq!(values[NOTEBOOK_KEY], local);
        assert_eq!(values[NOTEBOOK_TIMESTAMP_KEY], json!(50));
        assert!(stored_status(&h.store).unwrap().starts_with("error: "));
    }

    #[tokio::test]
    async fn test_meta_without_snapshot_is_an_error() {
        let h = harness(enabled_settings(), Some(50), Some(json!([])));
        h.remote.insert(META_FILE_NAME, json!({ "update_timestamp": 100 }));

        let outcome = h.manager.sync(false).await;

        assert!(matches!(outcome, SyncOutcome::Failed(ref m) if m.contains("missing")));
    }

    #[tokio::test]
    async fn test_meta_ahead_of_snapshot_does_not_regress_local() {
        let h = harness(enabled_settings(), Some(80), Some(json!([word("newer")])));
        h.remote.insert(META_FILE_NAME, json!({ "update_timestamp": 100 }));
        h.remote.insert(
            DATA_FILE_NAME,
            json!({ "update_timestamp": 60, "notebook": [word("older")] }),
        );

        let outcome = h.manager.sync(false).await;

        assert!(matches!(outcome, SyncOutcome::Failed(ref m) if m.contains("ahead")));
        assert_eq!(h.store.dump()[NOTEBOOK_KEY], json!([word("newer")]));
    }

    #[tokio::test]
    async fn test_interrupted_push_records_error() {
        let h = harness(enabled_settings(), Some(100), Some(json!([word("alpha")])));
        seed_remote(&h.remote, 50, json!([]));
        h.remote.fail_put(META_FILE_NAME);

        let outcome = h.manager.sync(false).await;

        assert!(matches!(outcome, SyncOutcome::Failed(ref m) if m.contains("503")));
        // Snapshot landed, pointer did not
        assert_eq!(h.remote.file(DATA_FILE_NAME).unwrap()["update_timestamp"], json!(100));
        assert_eq!(h.remote.file(META_FILE_NAME), Some(json!({ "update_timestamp": 50 })));
        assert!(stored_status(&h.store).unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_status_preserves_unrelated_settings() {
        let mut settings = enabled_settings();
        settings["remote_dir"] = json!("custom");
        let h = harness(settings, Some(0), None);

        h.manager.sync(false).await;

        let values = h.store.dump();
        let stored = &values[SYNC_SETTINGS_KEY];
        assert_eq!(stored["remote_dir"], json!("custom"));
        assert_eq!(stored["auto_sync_interval_min"], json!(30));
        assert_eq!(stored["password"], json!("secret"));
    }
}
