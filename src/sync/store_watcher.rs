//! Picks up writes that other processes make to the shared store file.
//!
//! A [`PollWatcher`] watches the data directory. Bursts of events are
//! collapsed, then the notebook timestamp and the sync settings are re-read
//! and compared with what was last seen. Differences go out on the
//! [`ChangeBus`], where the scheduler treats them like in-process edits.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ::notify::{Config, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::storage::{
    timestamp_from, LocalStore, StoreError, NOTEBOOK_TIMESTAMP_KEY, STORE_FILE, SYNC_SETTINGS_KEY,
};

use super::notify::{ChangeBus, LocalChange};

/// How often the poll watcher checks the data directory
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(750);

/// Events arriving this close together are handled as one change
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Settings keys the engine itself rewrites after every attempt
const STATUS_KEYS: [&str; 2] = ["last_sync_time", "last_sync_status"];

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("file watcher error: {0}")]
    Notify(#[from] ::notify::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Keeps the watcher alive; dropping it stops watching.
pub struct StoreWatcher {
    _watcher: PollWatcher,
    task: JoinHandle<()>,
}

impl Drop for StoreWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The parts of the store the watcher reacts to
#[derive(Debug, Default, PartialEq)]
struct Observed {
    timestamp: i64,
    settings: Option<Value>,
}

impl Observed {
    async fn read(store: &dyn LocalStore) -> Result<Self, StoreError> {
        let mut values = store
            .get(&[NOTEBOOK_TIMESTAMP_KEY, SYNC_SETTINGS_KEY])
            .await?;

        let settings = values.remove(SYNC_SETTINGS_KEY).map(|mut settings| {
            if let Value::Object(map) = &mut settings {
                for key in STATUS_KEYS {
                    map.remove(key);
                }
            }
            settings
        });

        Ok(Self {
            timestamp: timestamp_from(values.get(NOTEBOOK_TIMESTAMP_KEY)),
            settings,
        })
    }
}

/// Watch `dir` (the directory holding `store.json`) for writes from other
/// processes.
///
/// A new notebook timestamp publishes [`LocalChange::NotebookChanged`]. An
/// edit to the sync settings, other than the recorded status of the last
/// attempt, publishes [`LocalChange::SettingsChanged`].
pub async fn start_store_watcher(
    store: Arc<dyn LocalStore>,
    dir: &Path,
    changes: ChangeBus,
    poll_interval: Duration,
) -> Result<StoreWatcher, WatchError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(StoreError::from)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<()>();

    let config = Config::default().with_poll_interval(poll_interval);
    let mut watcher = PollWatcher::new(
        move |res: Result<Event, ::notify::Error>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    log::warn!("Store watcher: watch error: {}", e);
                    return;
                }
            };

            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }

            // Temp files and the lock file come and go around every write
            if event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(OsStr::new(STORE_FILE)))
            {
                let _ = tx.send(());
            }
        },
        config,
    )?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    // Baseline after the watcher is armed so nothing written in between is lost
    let mut last = Observed::read(store.as_ref()).await?;

    let task = tokio::spawn(async move {
        while rx.recv().await.is_some() {
            tokio::time::sleep(DEBOUNCE_WINDOW).await;
            while rx.try_recv().is_ok() {}

            let current = match Observed::read(store.as_ref()).await {
                Ok(current) => current,
                Err(e) => {
                    log::warn!("Store watcher: cannot read store: {}", e);
                    continue;
                }
            };

            if current.timestamp != last.timestamp {
                log::debug!(
                    "Store watcher: notebook timestamp {} -> {}",
                    last.timestamp,
                    current.timestamp
                );
                changes.publish(LocalChange::NotebookChanged);
            }
            if current.settings != last.settings {
                log::debug!("Store watcher: sync settings changed");
                changes.publish(LocalChange::SettingsChanged);
            }
            last = current;
        }
    });

    log::info!("Store watcher: watching {}", dir.display());

    Ok(StoreWatcher {
        _watcher: watcher,
        task,
    })
}
