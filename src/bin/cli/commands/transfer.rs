use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub async fn run_import(app: &App, file: &Path, format: &OutputFormat) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let export: serde_json::Value =
        serde_json::from_str(&content).context("Import file is not valid JSON")?;

    let count = app
        .notebook
        .import_saladict(&export)
        .await
        .context("Failed to import words")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "imported": count })),
        OutputFormat::Plain => println!("Imported {} word(s).", count),
    }
    Ok(())
}

pub async fn run_export(app: &App, output: Option<&Path>) -> Result<()> {
    let json = app.notebook.export_json().await.context("Failed to export notebook")?;

    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Exported to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub async fn run_clear(app: &App, yes: bool) -> Result<()> {
    if !yes {
        bail!("This deletes every word. Run `export` first, then repeat with --yes.");
    }

    let backup = app.data_dir.join(format!(
        "vocabulary_notebook_backup_{}.json",
        chrono::Local::now().format("%Y-%m-%d")
    ));
    let json = app.notebook.export_json().await.context("Failed to export notebook")?;
    tokio::fs::write(&backup, json)
        .await
        .with_context(|| format!("Failed to write {}", backup.display()))?;

    app.notebook.clear().await.context("Failed to clear notebook")?;
    println!("All words deleted. Backup written to {}", backup.display());
    Ok(())
}
