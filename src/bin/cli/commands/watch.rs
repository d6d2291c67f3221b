use std::sync::Arc;

use anyhow::{Context, Result};

use wordnest_lib::sync::store_watcher::DEFAULT_POLL_INTERVAL;
use wordnest_lib::sync::{start_store_watcher, start_sync_scheduler, TokioAlarms};

use crate::app::App;
use crate::OutputFormat;

/// Run the scheduler in the foreground, printing surface events.
///
/// Edits made by other `wordnest-cli` invocations reach the scheduler
/// through the store watcher.
pub async fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let alarms = Arc::new(TokioAlarms::new());
    let scheduler = start_sync_scheduler(
        app.sync.clone(),
        alarms,
        &app.changes,
        app.config.debounce(),
    );
    let _watcher = start_store_watcher(
        app.store.clone(),
        &app.data_dir,
        app.changes.clone(),
        DEFAULT_POLL_INTERVAL,
    )
    .await
    .context("Failed to watch the data directory")?;
    let mut events = app.notifier.subscribe();

    eprintln!("Watching {} (Ctrl-C to stop)", app.data_dir.display());

    loop {
        tokio::select! {
            event = events.recv() => {
                let Ok(event) = event else { continue };
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string(&event)?),
                    OutputFormat::Plain => println!("{:?}", event),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    scheduler.shutdown();
    Ok(())
}
