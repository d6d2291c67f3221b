use anyhow::{bail, Result};

use wordnest_lib::storage::{timestamp_from, LocalStore, NOTEBOOK_KEY, NOTEBOOK_TIMESTAMP_KEY};

use crate::app::App;
use crate::render::terminal::{format_millis, format_time, paint, Color};
use crate::OutputFormat;

/// Fields to change; `None` leaves the stored value alone
pub struct SettingsUpdate {
    pub server_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub interval: Option<u64>,
    pub enabled: Option<bool>,
}

pub async fn run_configure(app: &App, update: SettingsUpdate, format: &OutputFormat) -> Result<()> {
    let mut settings = app.settings().await?;

    if let Some(url) = update.server_url {
        settings.server_url = url.trim().to_string();
    }
    if let Some(username) = update.username {
        settings.username = username.trim().to_string();
    }
    if let Some(password) = update.password {
        settings.password = Some(password);
    }
    if let Some(interval) = update.interval {
        settings.auto_sync_interval_min = Some(interval);
    }
    if let Some(enabled) = update.enabled {
        settings.enabled = enabled;
    }

    if settings.enabled {
        if let Err(e) = settings.validate() {
            bail!("Cannot enable sync: {}", e);
        }
    }

    app.save_settings(&settings).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "saved": true })),
        OutputFormat::Plain => println!("Sync settings saved."),
    }
    Ok(())
}

pub async fn run_status(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let settings = app.settings().await?;
    let values = app.store.get(&[NOTEBOOK_KEY, NOTEBOOK_TIMESTAMP_KEY]).await?;
    let word_count = values
        .get(NOTEBOOK_KEY)
        .and_then(|v| v.as_array())
        .map(|a| a.len())
        .unwrap_or(0);
    let local_ts = timestamp_from(values.get(NOTEBOOK_TIMESTAMP_KEY));

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "dataDir": app.data_dir.to_string_lossy(),
                "enabled": settings.enabled,
                "serverUrl": settings.server_url,
                "username": settings.username,
                "passwordSet": settings.password.is_some(),
                "autoSyncIntervalMin": settings.auto_sync_interval_min,
                "lastSyncTime": settings.last_sync_time,
                "lastSyncStatus": settings.last_sync_status,
                "wordCount": word_count,
                "localTimestamp": local_ts,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let enabled = if settings.enabled {
                paint("enabled", Color::GREEN, use_color)
            } else {
                paint("disabled", Color::DIM, use_color)
            };
            let interval = match settings.auto_sync_interval_min {
                Some(m) if m > 0 => format!("every {} min", m),
                _ => "off".to_string(),
            };
            let status = match settings.last_sync_status.as_deref() {
                Some("success") => paint("success", Color::GREEN, use_color),
                Some(other) => paint(other, Color::RED, use_color),
                None => "-".to_string(),
            };

            println!("Data dir:     {}", app.data_dir.display());
            println!("Sync:         {}", enabled);
            println!("Server:       {}", if settings.server_url.is_empty() { "-" } else { settings.server_url.as_str() });
            println!("Username:     {}", if settings.username.is_empty() { "-" } else { settings.username.as_str() });
            println!("Password:     {}", if settings.password.is_some() { "set" } else { "not set" });
            println!("Auto-sync:    {}", interval);
            println!("Last sync:    {} ({})", format_time(settings.last_sync_time), status);
            println!("Words:        {}", word_count);
            println!("Last change:  {}", format_millis(local_ts));
        }
    }
    Ok(())
}

pub async fn run_check(app: &App, format: &OutputFormat) -> Result<()> {
    let settings = app.settings().await?;
    let reachable = app.sync.test_connection(&settings).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "reachable": reachable })),
        OutputFormat::Plain => {
            if reachable {
                println!("Connected to {}", settings.server_url);
            } else {
                println!("Could not reach {}", settings.server_url);
            }
        }
    }

    if !reachable {
        bail!("connection check failed");
    }
    Ok(())
}
