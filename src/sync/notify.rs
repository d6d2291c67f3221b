use serde::Serialize;
use tokio::sync::broadcast;

/// Capacity of the broadcast channels; slow subscribers skip ahead
const CHANNEL_CAPACITY: usize = 64;

/// Events delivered to running surfaces (open pages, dashboard, popup)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurfaceEvent {
    /// The notebook changed locally; redraw highlights
    RefreshHighlights,
    /// A pull replaced the local notebook
    SyncCompleted { old_count: usize, new_count: usize },
}

/// Best-effort fan-out to every running surface.
///
/// Delivery is fire-and-forget: implementations swallow per-target failures
/// and never block the caller.
pub trait Notifier: Send + Sync {
    fn notify_all(&self, event: SurfaceEvent);
}

/// Notifier backed by a tokio broadcast channel
pub struct BroadcastNotifier {
    sender: broadcast::Sender<SurfaceEvent>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify_all(&self, event: SurfaceEvent) {
        // Err only means nobody is listening
        match self.sender.send(event) {
            Ok(receivers) => log::debug!("notify: delivered to {} surface(s)", receivers),
            Err(broadcast::error::SendError(event)) => {
                log::debug!("notify: no surfaces listening for {:?}", event)
            }
        }
    }
}

/// Local mutation events consumed by the sync scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalChange {
    /// The notebook and its timestamp were written
    NotebookChanged,
    /// Stored sync settings were edited
    SettingsChanged,
}

/// Event bus between local mutators and the scheduler's debounce timer
#[derive(Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<LocalChange>,
}

impl ChangeBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, change: LocalChange) {
        let _ = self.sender.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LocalChange> {
        self.sender.subscribe()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}
