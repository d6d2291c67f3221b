use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::manager::{SyncManager, SyncOutcome};
use super::notify::{ChangeBus, LocalChange};

/// Name of the periodic auto-sync alarm
pub const AUTO_SYNC_ALARM: &str = "vocabulary_auto_sync";

/// Quiet period after the last local change before a sync runs
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(10);

pub type AlarmCallback = Arc<dyn Fn() + Send + Sync>;

/// Named repeating alarms. Scheduling a name that is already armed
/// replaces the old alarm.
pub trait IntervalScheduler: Send + Sync {
    fn schedule(&self, name: &str, period: Duration, callback: AlarmCallback);
    fn cancel(&self, name: &str);
}

/// Alarms backed by tokio interval tasks
#[derive(Default)]
pub struct TokioAlarms {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioAlarms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.tasks
            .lock()
            .map(|tasks| tasks.contains_key(name))
            .unwrap_or(false)
    }
}

impl IntervalScheduler for TokioAlarms {
    fn schedule(&self, name: &str, period: Duration, callback: AlarmCallback) {
        let handle = tokio::spawn(async move {
            // First tick one full period from now
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback();
            }
        });

        let Ok(mut tasks) = self.tasks.lock() else {
            handle.abort();
            return;
        };
        if let Some(previous) = tasks.insert(name.to_string(), handle) {
            previous.abort();
        }
        log::debug!("Alarm '{}' armed every {:?}", name, period);
    }

    fn cancel(&self, name: &str) {
        if let Ok(mut tasks) = self.tasks.lock() {
            if let Some(handle) = tasks.remove(name) {
                handle.abort();
                log::debug!("Alarm '{}' cleared", name);
            }
        }
    }
}

impl Drop for TokioAlarms {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.get_mut() {
            for (_, handle) in tasks.drain() {
                handle.abort();
            }
        }
    }
}

/// Messages to control the sync scheduler
#[derive(Debug)]
pub enum SyncSchedulerMessage {
    /// Settings changed, re-arm or clear the periodic alarm
    Reload,
    /// The periodic alarm went off
    AlarmFired,
    /// Manual "sync now", bypasses the enabled flag
    SyncNow { reply: oneshot::Sender<SyncOutcome> },
    Shutdown,
}

/// Handle for the sync scheduler
#[derive(Clone)]
pub struct SyncScheduler {
    sender: mpsc::Sender<SyncSchedulerMessage>,
}

impl SyncScheduler {
    /// Notify the scheduler that sync settings have changed
    pub fn reload(&self) {
        let _ = self.sender.try_send(SyncSchedulerMessage::Reload);
    }

    /// Run a forced sync and wait for its outcome
    pub async fn sync_now(&self) -> SyncOutcome {
        let (reply, outcome) = oneshot::channel();
        if self
            .sender
            .send(SyncSchedulerMessage::SyncNow { reply })
            .await
            .is_err()
        {
            return SyncOutcome::Failed("sync scheduler is not running".to_string());
        }
        outcome
            .await
            .unwrap_or_else(|_| SyncOutcome::Failed("sync scheduler is not running".to_string()))
    }

    pub fn shutdown(&self) {
        let _ = self.sender.try_send(SyncSchedulerMessage::Shutdown);
    }
}

/// Start the sync scheduler.
///
/// Spawns a loop that owns the auto-sync alarm and the debounce timer for
/// local changes. Every trigger funnels into [`SyncManager::sync`], whose
/// in-progress guard drops overlapping attempts.
pub fn start_sync_scheduler(
    sync_manager: Arc<SyncManager>,
    alarms: Arc<dyn IntervalScheduler>,
    changes: &ChangeBus,
    debounce: Duration,
) -> SyncScheduler {
    let (tx, rx) = mpsc::channel(32);
    let change_rx = changes.subscribe();

    let weak = tx.downgrade();
    let on_alarm: AlarmCallback = Arc::new(move || {
        if let Some(tx) = weak.upgrade() {
            let _ = tx.try_send(SyncSchedulerMessage::AlarmFired);
        }
    });

    tokio::spawn(sync_scheduler_loop(
        sync_manager,
        alarms,
        on_alarm,
        change_rx,
        debounce,
        rx,
    ));

    // Arm the alarm from the stored settings
    let _ = tx.try_send(SyncSchedulerMessage::Reload);

    SyncScheduler { sender: tx }
}

async fn rearm_alarm(
    sync_manager: &SyncManager,
    alarms: &dyn IntervalScheduler,
    on_alarm: &AlarmCallback,
) {
    let settings = match sync_manager.load_settings().await {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Sync scheduler: cannot read settings: {}", e);
            None
        }
    };

    match settings.as_ref().and_then(|s| s.periodic_interval()) {
        Some(period) => {
            log::info!(
                "Sync scheduler: auto-sync every {} min",
                period.as_secs() / 60
            );
            alarms.schedule(AUTO_SYNC_ALARM, period, on_alarm.clone());
        }
        None => {
            log::info!("Sync scheduler: auto-sync off");
            alarms.cancel(AUTO_SYNC_ALARM);
        }
    }
}

fn spawn_sync(sync_manager: &Arc<SyncManager>, trigger: &'static str) {
    let sync_manager = sync_manager.clone();
    tokio::spawn(async move {
        let outcome = sync_manager.sync(false).await;
        log::info!("Sync scheduler: {} sync finished: {:?}", trigger, outcome);
    });
}

async fn sync_scheduler_loop(
    sync_manager: Arc<SyncManager>,
    alarms: Arc<dyn IntervalScheduler>,
    on_alarm: AlarmCallback,
    mut changes: broadcast::Receiver<LocalChange>,
    debounce: Duration,
    mut receiver: mpsc::Receiver<SyncSchedulerMessage>,
) {
    log::info!("Sync scheduler started");

    let mut deadline: Option<Instant> = None;
    let mut changes_open = true;

    loop {
        let sleep_target = deadline.unwrap_or_else(Instant::now);

        tokio::select! {
            msg = receiver.recv() => {
                match msg {
                    Some(SyncSchedulerMessage::Reload) => {
                        rearm_alarm(&sync_manager, alarms.as_ref(), &on_alarm).await;
                    }
                    Some(SyncSchedulerMessage::AlarmFired) => {
                        spawn_sync(&sync_manager, "periodic");
                    }
                    Some(SyncSchedulerMessage::SyncNow { reply }) => {
                        let sync_manager = sync_manager.clone();
                        tokio::spawn(async move {
                            let outcome = sync_manager.sync(true).await;
                            let _ = reply.send(outcome);
                        });
                    }
                    Some(SyncSchedulerMessage::Shutdown) | None => {
                        log::info!("Sync scheduler: shutting down");
                        break;
                    }
                }
            }

            change = changes.recv(), if changes_open => {
                match change {
                    Ok(LocalChange::SettingsChanged) => {
                        rearm_alarm(&sync_manager, alarms.as_ref(), &on_alarm).await;
                    }
                    Ok(LocalChange::NotebookChanged) | Err(RecvError::Lagged(_)) => {
                        deadline = Some(Instant::now() + debounce);
                    }
                    Err(RecvError::Closed) => {
                        changes_open = false;
                    }
                }
            }

            _ = tokio::time::sleep_until(sleep_target), if deadline.is_some() => {
                deadline = None;
                spawn_sync(&sync_manager, "debounced");
            }
        }
    }

    alarms.cancel(AUTO_SYNC_ALARM);
}
