use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::storage::{
    timestamp_from, LocalStore, StoreError, BACKUP_PRE_CLEANUP_KEY, NOTEBOOK_KEY,
    NOTEBOOK_TIMESTAMP_KEY,
};
use crate::sync::notify::{ChangeBus, LocalChange, Notifier, SurfaceEvent};

use super::models::{CleanupDetail, CleanupReport, Context, NotebookEntry, Stats, WordInput};

/// Default cap on contexts kept per word by a cleanup
pub const DEFAULT_MAX_CONTEXTS: usize = 20;

const IMPORTED_TITLE: &str = "Imported";

#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Word not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, NotebookError>;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Read and write access to the notebook.
///
/// Every change persists the notebook together with a strictly increasing
/// update timestamp, then announces itself on the change bus (for sync)
/// and to open surfaces (for highlighting).
pub struct NotebookApi {
    store: Arc<dyn LocalStore>,
    changes: ChangeBus,
    notifier: Arc<dyn Notifier>,
    write_lock: Mutex<()>,
}

impl NotebookApi {
    pub fn new(store: Arc<dyn LocalStore>, changes: ChangeBus, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            changes,
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    /// Load the notebook, assigning ids to contexts that lack one.
    pub async fn get_notebook(&self) -> Result<Vec<NotebookEntry>> {
        let _lock = self.write_lock.lock().await;
        let (notebook, _) = self.load().await?;
        Ok(notebook)
    }

    pub async fn add_or_update_word(&self, input: WordInput) -> Result<NotebookEntry> {
        let text = input.text.trim();
        if text.is_empty() {
            return Err(NotebookError::InvalidInput("word text is empty".to_string()));
        }

        let _lock = self.write_lock.lock().await;
        let (mut notebook, ts) = self.load().await?;
        let now = now_ms();

        let entry = match notebook.iter_mut().find(|e| e.matches_text(text)) {
            Some(entry) => {
                if let Some(context) = input.context {
                    let sentence = context.sentence.trim();
                    if !entry.contexts.iter().any(|c| c.sentence.trim() == sentence) {
                        entry.contexts.push(new_context(context.sentence, context.url, context.title, context.favicon, now));
                    }
                }
                if let Some(note) = input.note.filter(|n| !n.is_empty()) {
                    entry.note = note;
                }
                if entry.translation.is_empty() {
                    if let Some(translation) = input.translation {
                        entry.translation = translation;
                    }
                }
                entry.stats.updated_at = now;
                entry.clone()
            }
            None => {
                let entry = NotebookEntry {
                    id: new_id(),
                    text: text.to_string(),
                    original_text: text.to_string(),
                    translation: input.translation.unwrap_or_default(),
                    contexts: input
                        .context
                        .map(|c| new_context(c.sentence, c.url, c.title, c.favicon, now))
                        .into_iter()
                        .collect(),
                    note: input.note.unwrap_or_default(),
                    tags: Vec::new(),
                    stats: new_stats(now, now),
                    extra: Map::new(),
                };
                notebook.push(entry.clone());
                entry
            }
        };

        self.save(&notebook, ts).await?;
        Ok(entry)
    }

    pub async fn update_note(&self, id: &str, note: &str) -> Result<()> {
        let _lock = self.write_lock.lock().await;
        let (mut notebook, ts) = self.load().await?;

        let entry = notebook
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| NotebookError::NotFound(id.to_string()))?;
        entry.note = note.to_string();
        entry.stats.updated_at = now_ms();

        self.save(&notebook, ts).await?;
        Ok(())
    }

    /// Write back a looked-up translation. Returns false when the word is not
    /// saved or the translation is empty.
    pub async fn set_translation(&self, text: &str, translation: &str) -> Result<bool> {
        if translation.is_empty() {
            return Ok(false);
        }

        let _lock = self.write_lock.lock().await;
        let (mut notebook, ts) = self.load().await?;

        let Some(entry) = notebook.iter_mut().find(|e| e.matches_text(text)) else {
            return Ok(false);
        };
        entry.translation = translation.to_string();
        entry.stats.updated_at = now_ms();

        self.save(&notebook, ts).await?;
        Ok(true)
    }

    pub async fn delete_word(&self, id: &str) -> Result<bool> {
        let _lock = self.write_lock.lock().await;
        let (mut notebook, ts) = self.load().await?;

        let before = notebook.len();
        notebook.retain(|e| e.id != id);
        if notebook.len() == before {
            return Ok(false);
        }

        self.save(&notebook, ts).await?;
        Ok(true)
    }

    pub async fn delete_context(&self, word_id: &str, context_id: &str) -> Result<bool> {
        let _lock = self.write_lock.lock().await;
        let (mut notebook, ts) = self.load().await?;

        let Some(entry) = notebook.iter_mut().find(|e| e.id == word_id) else {
            return Ok(false);
        };
        let before = entry.contexts.len();
        entry.contexts.retain(|c| c.id.as_deref() != Some(context_id));
        if entry.contexts.len() == before {
            return Ok(false);
        }
        entry.stats.updated_at = now_ms();

        self.save(&notebook, ts).await?;
        Ok(true)
    }

    /// Deduplicate contexts by sentence (keeping the newest), order them
    /// newest first and keep at most `max`.
    ///
    /// With no `word_id` every word is cleaned, after copying the whole
    /// notebook to the pre-cleanup backup key.
    pub async fn cleanup_contexts(&self, word_id: Option<&str>, max: usize) -> Result<CleanupReport> {
        let _lock = self.write_lock.lock().await;
        let (mut notebook, ts) = self.load().await?;
        let now = now_ms();
        let mut report = CleanupReport::default();

        match word_id {
            Some(id) => {
                if let Some(entry) = notebook.iter_mut().find(|e| e.id == id) {
                    cleanup_entry(entry, max, now, &mut report);
                }
            }
            None => {
                let mut backup = Map::new();
                backup.insert(BACKUP_PRE_CLEANUP_KEY.to_string(), serde_json::to_value(&notebook)?);
                self.store.set(backup).await?;

                for entry in notebook.iter_mut() {
                    cleanup_entry(entry, max, now, &mut report);
                }
            }
        }

        if report.changed {
            self.save(&notebook, ts).await?;
        }
        Ok(report)
    }

    /// Merge a Saladict export (`{ "words": [...] }`). Returns how many
    /// words were added or updated.
    pub async fn import_saladict(&self, export: &Value) -> Result<usize> {
        let Some(words) = export.get("words").and_then(Value::as_array) else {
            return Ok(0);
        };

        let _lock = self.write_lock.lock().await;
        let (mut notebook, ts) = self.load().await?;
        let now = now_ms();
        let mut count = 0;

        for word in words {
            let Some(raw_text) = word.get("text").and_then(Value::as_str) else {
                continue;
            };
            let text = raw_text.trim();
            if text.is_empty() {
                continue;
            }

            let field = |key: &str| word.get(key).and_then(Value::as_str).unwrap_or("").to_string();
            let date = match timestamp_from(word.get("date")) {
                0 => now,
                date => date,
            };
            let title = match field("title") {
                t if t.is_empty() => IMPORTED_TITLE.to_string(),
                t => t,
            };
            let context = new_context(field("context"), field("url"), title, field("favicon"), date);
            let note = field("note");

            match notebook.iter_mut().find(|e| e.matches_text(text)) {
                Some(entry) => {
                    if !note.is_empty() {
                        entry.note = format!("{}\n{}", entry.note, note).trim().to_string();
                    }
                    entry.contexts.push(context);
                    entry.stats.updated_at = now;
                }
                None => notebook.push(NotebookEntry {
                    id: new_id(),
                    text: text.to_string(),
                    original_text: raw_text.to_string(),
                    translation: String::new(),
                    contexts: vec![context],
                    note,
                    tags: Vec::new(),
                    stats: new_stats(date, now),
                    extra: Map::new(),
                }),
            }
            count += 1;
        }

        if count > 0 {
            self.save(&notebook, ts).await?;
        }
        log::info!("Notebook: imported {} Saladict word(s)", count);
        Ok(count)
    }

    /// Remove every word. The timestamp still advances so the empty
    /// notebook wins on the next sync.
    pub async fn clear(&self) -> Result<()> {
        let _lock = self.write_lock.lock().await;
        let (_, ts) = self.load().await?;
        self.save(&[], ts).await?;
        Ok(())
    }

    pub async fn export_json(&self) -> Result<String> {
        let notebook = self.get_notebook().await?;
        Ok(serde_json::to_string_pretty(&notebook)?)
    }

    /// Read the notebook and its timestamp. Contexts without an id are
    /// given one and the result saved straight away.
    async fn load(&self) -> Result<(Vec<NotebookEntry>, i64)> {
        let values = self.store.get(&[NOTEBOOK_KEY, NOTEBOOK_TIMESTAMP_KEY]).await?;
        let mut ts = timestamp_from(values.get(NOTEBOOK_TIMESTAMP_KEY));

        let mut notebook: Vec<NotebookEntry> = match values.get(NOTEBOOK_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value.clone())?,
        };

        let mut migrated = 0;
        for context in notebook.iter_mut().flat_map(|e| e.contexts.iter_mut()) {
            if context.id.is_none() {
                context.id = Some(new_id());
                migrated += 1;
            }
        }
        if migrated > 0 {
            log::info!("Notebook: assigned ids to {} context(s)", migrated);
            ts = self.save(&notebook, ts).await?;
        }

        Ok((notebook, ts))
    }

    async fn save(&self, notebook: &[NotebookEntry], previous_ts: i64) -> Result<i64> {
        let ts = now_ms().max(previous_ts + 1);

        let mut items = Map::new();
        items.insert(NOTEBOOK_KEY.to_string(), serde_json::to_value(notebook)?);
        items.insert(NOTEBOOK_TIMESTAMP_KEY.to_string(), Value::from(ts));
        self.store.set(items).await?;

        self.changes.publish(LocalChange::NotebookChanged);
        self.notifier.notify_all(SurfaceEvent::RefreshHighlights);
        Ok(ts)
    }
}

fn new_context(sentence: String, url: String, title: String, favicon: String, timestamp: i64) -> Context {
    Context {
        id: Some(new_id()),
        sentence,
        url,
        title,
        favicon,
        timestamp,
        extra: Map::new(),
    }
}

fn new_stats(created_at: i64, updated_at: i64) -> Stats {
    Stats {
        created_at,
        updated_at,
        review_count: 0,
        extra: Map::new(),
    }
}

fn cleanup_entry(entry: &mut NotebookEntry, max: usize, now: i64, report: &mut CleanupReport) {
    if entry.contexts.is_empty() {
        return;
    }
    let original = entry.contexts.len();

    let mut kept: Vec<Context> = Vec::with_capacity(original);
    let mut by_sentence: HashMap<String, usize> = HashMap::new();
    for context in entry.contexts.drain(..) {
        let key = context.sentence.trim().to_lowercase();
        match by_sentence.get(&key).copied() {
            Some(i) => {
                if context.timestamp > kept[i].timestamp {
                    kept[i] = context;
                }
            }
            None => {
                by_sentence.insert(key, kept.len());
                kept.push(context);
            }
        }
    }

    kept.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    kept.truncate(max);

    if kept.len() != original {
        entry.stats.updated_at = now;
        report.changed = true;
        report.details.push(CleanupDetail {
            text: entry.text.clone(),
            removed: original - kept.len(),
        });
    }
    entry.contexts = kept;
}
