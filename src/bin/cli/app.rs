use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use wordnest_lib::config::EngineConfig;
use wordnest_lib::notebook::{NotebookApi, NotebookEntry};
use wordnest_lib::storage::{FileStore, LocalStore, SYNC_SETTINGS_KEY};
use wordnest_lib::sync::webdav::WebDAVConnector;
use wordnest_lib::sync::{BroadcastNotifier, ChangeBus, SyncManager, SyncSettings};

/// Shared application state for CLI commands
pub struct App {
    pub data_dir: PathBuf,
    pub config: EngineConfig,
    pub store: Arc<FileStore>,
    pub changes: ChangeBus,
    pub notifier: Arc<BroadcastNotifier>,
    pub notebook: NotebookApi,
    pub sync: Arc<SyncManager>,
}

impl App {
    /// Initialize from the given or default data directory
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let (data_dir, config) = EngineConfig::resolve(data_dir)
            .context("Failed to load engine configuration")?;

        let store = Arc::new(FileStore::new(data_dir.clone()));
        store.init().context("Failed to initialize storage")?;

        let changes = ChangeBus::new();
        let notifier = Arc::new(BroadcastNotifier::new());
        let notebook = NotebookApi::new(store.clone(), changes.clone(), notifier.clone());

        let connector = Arc::new(WebDAVConnector::new(
            config.remote_dir.clone(),
            config.connect_timeout(),
        ));
        let sync = Arc::new(SyncManager::new(store.clone(), connector, notifier.clone()));

        Ok(Self {
            data_dir,
            config,
            store,
            changes,
            notifier,
            notebook,
            sync,
        })
    }

    /// Stored sync settings, or defaults when none are saved yet
    pub async fn settings(&self) -> Result<SyncSettings> {
        Ok(self
            .sync
            .load_settings()
            .await
            .context("Failed to read sync settings")?
            .unwrap_or_default())
    }

    pub async fn save_settings(&self, settings: &SyncSettings) -> Result<()> {
        let mut items = serde_json::Map::new();
        items.insert(SYNC_SETTINGS_KEY.to_string(), serde_json::to_value(settings)?);
        self.store
            .set(items)
            .await
            .context("Failed to save sync settings")?;
        Ok(())
    }

    /// Find a word by id (exact, or unique prefix)
    pub async fn find_word(&self, id: &str) -> Result<NotebookEntry> {
        let notebook = self
            .notebook
            .get_notebook()
            .await
            .context("Failed to load notebook")?;

        if let Some(entry) = notebook.iter().find(|e| e.id == id) {
            return Ok(entry.clone());
        }

        let matches: Vec<&NotebookEntry> = notebook.iter().filter(|e| e.id.starts_with(id)).collect();

        match matches.len() {
            0 => bail!("No word with id '{}'", id),
            1 => Ok(matches[0].clone()),
            _ => bail!("Ambiguous id '{}'. Matches:\n{}", id,
                matches.iter().map(|e| format!("  - {} ({})", e.id, e.text)).collect::<Vec<_>>().join("\n")),
        }
    }
}
