pub mod config;
pub mod notify;
pub mod scheduler;
pub mod store_watcher;
pub mod webdav;

mod manager;

pub use config::{RemoteMeta, Snapshot, SyncCredentials, SyncSettings, SyncStatus};
pub use manager::{decide, SkipReason, SyncAction, SyncError, SyncManager, SyncOutcome};
pub use notify::{BroadcastNotifier, ChangeBus, LocalChange, Notifier, SurfaceEvent};
pub use scheduler::{
    start_sync_scheduler, IntervalScheduler, SyncScheduler, SyncSchedulerMessage, TokioAlarms,
};
pub use store_watcher::{start_store_watcher, StoreWatcher, WatchError};
pub use webdav::{RemoteConnector, RemoteStore, WebDAVClient, WebDAVConnector, WebDAVError};
