//! Vocabulary notebook storage with WebDAV snapshot sync.
//!
//! The notebook lives in a local key-value store. [`sync::SyncManager`]
//! reconciles it with a remote copy by last-writer-wins on a logical
//! timestamp, and [`sync::SyncScheduler`] drives it from a periodic alarm,
//! a debounce on local changes and manual requests.

pub mod config;
pub mod notebook;
pub mod storage;
pub mod sync;

pub use config::EngineConfig;
pub use notebook::NotebookApi;
pub use storage::{FileStore, LocalStore, MemoryStore};
pub use sync::{SyncManager, SyncOutcome, SyncScheduler};
