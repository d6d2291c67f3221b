use anyhow::{bail, Result};

use wordnest_lib::sync::{SkipReason, SyncOutcome};

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn outcome_json(outcome: &SyncOutcome) -> serde_json::Value {
    match outcome {
        SyncOutcome::Pushed { timestamp } => serde_json::json!({
            "result": "pushed",
            "timestamp": timestamp,
        }),
        SyncOutcome::Pulled { timestamp, old_count, new_count } => serde_json::json!({
            "result": "pulled",
            "timestamp": timestamp,
            "oldCount": old_count,
            "newCount": new_count,
        }),
        SyncOutcome::UpToDate { timestamp } => serde_json::json!({
            "result": "upToDate",
            "timestamp": timestamp,
        }),
        SyncOutcome::Skipped(reason) => serde_json::json!({
            "result": "skipped",
            "reason": match reason {
                SkipReason::InProgress => "inProgress",
                SkipReason::Disabled => "disabled",
            },
        }),
        SyncOutcome::Failed(message) => serde_json::json!({
            "result": "failed",
            "error": message,
        }),
    }
}

pub fn outcome_line(outcome: &SyncOutcome, use_color: bool) -> String {
    match outcome {
        SyncOutcome::Pushed { .. } => paint("Uploaded local notebook to server", Color::GREEN, use_color),
        SyncOutcome::Pulled { old_count, new_count, .. } => paint(
            &format!("Downloaded notebook from server ({} -> {} words)", old_count, new_count),
            Color::GREEN,
            use_color,
        ),
        SyncOutcome::UpToDate { .. } => "Already up to date".to_string(),
        SyncOutcome::Skipped(SkipReason::Disabled) => {
            "Sync is disabled (use --force to sync anyway)".to_string()
        }
        SyncOutcome::Skipped(SkipReason::InProgress) => "A sync is already running".to_string(),
        SyncOutcome::Failed(message) => paint(&format!("Sync failed: {}", message), Color::RED, use_color),
    }
}

pub async fn run(app: &App, force: bool, format: &OutputFormat, use_color: bool) -> Result<()> {
    let outcome = app.sync.sync(force).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome))?),
        OutputFormat::Plain => println!("{}", outcome_line(&outcome, use_color)),
    }

    if let SyncOutcome::Failed(message) = outcome {
        bail!(message);
    }
    Ok(())
}
