use anyhow::{bail, Context, Result};

use wordnest_lib::notebook::{ContextInput, WordInput};

use crate::app::App;
use crate::render::terminal::render_entry;
use crate::OutputFormat;

pub fn word_input(
    word: String,
    sentence: Option<String>,
    url: Option<String>,
    title: Option<String>,
    translation: Option<String>,
    note: Option<String>,
) -> WordInput {
    WordInput {
        text: word,
        translation,
        context: sentence.map(|sentence| ContextInput {
            sentence,
            url: url.unwrap_or_default(),
            title: title.unwrap_or_default(),
            favicon: String::new(),
        }),
        note,
    }
}

pub async fn run_add(app: &App, input: WordInput, format: &OutputFormat, use_color: bool) -> Result<()> {
    let entry = app
        .notebook
        .add_or_update_word(input)
        .await
        .context("Failed to save word")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entry)?),
        OutputFormat::Plain => {
            for line in render_entry(&entry, true, use_color) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

pub async fn run_list(
    app: &App,
    search: Option<&str>,
    show_contexts: bool,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut notebook = app.notebook.get_notebook().await.context("Failed to load notebook")?;

    if let Some(term) = search {
        let term = term.to_lowercase();
        notebook.retain(|e| {
            e.text.to_lowercase().contains(&term)
                || e.translation.to_lowercase().contains(&term)
                || e.note.to_lowercase().contains(&term)
        });
    }

    // Most recently touched first
    notebook.sort_by(|a, b| b.stats.updated_at.cmp(&a.stats.updated_at));

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&notebook)?),
        OutputFormat::Plain => {
            if notebook.is_empty() {
                println!("No words found.");
                return Ok(());
            }
            for entry in &notebook {
                for line in render_entry(entry, show_contexts, use_color) {
                    println!("{}", line);
                }
            }
            println!("\n{} words total", notebook.len());
        }
    }
    Ok(())
}

pub async fn run_note(app: &App, id: &str, note: &str) -> Result<()> {
    let entry = app.find_word(id).await?;
    app.notebook
        .update_note(&entry.id, note)
        .await
        .context("Failed to update note")?;
    println!("Updated note on '{}'.", entry.text);
    Ok(())
}

pub async fn run_delete(app: &App, id: &str) -> Result<()> {
    let entry = app.find_word(id).await?;
    app.notebook
        .delete_word(&entry.id)
        .await
        .context("Failed to delete word")?;
    println!("Deleted '{}'.", entry.text);
    Ok(())
}

pub async fn run_delete_context(app: &App, word_id: &str, context_id: &str) -> Result<()> {
    let entry = app.find_word(word_id).await?;

    let matches: Vec<&str> = entry
        .contexts
        .iter()
        .filter_map(|c| c.id.as_deref())
        .filter(|id| id.starts_with(context_id))
        .collect();
    let full_id = match matches.as_slice() {
        [id] => id.to_string(),
        [] => bail!("'{}' has no context with id '{}'", entry.text, context_id),
        _ => bail!("Ambiguous context id '{}'", context_id),
    };

    app.notebook
        .delete_context(&entry.id, &full_id)
        .await
        .context("Failed to delete context")?;
    println!("Deleted context from '{}'.", entry.text);
    Ok(())
}

pub async fn run_cleanup(app: &App, word: Option<&str>, max: usize, format: &OutputFormat) -> Result<()> {
    let word_id = match word {
        Some(id) => Some(app.find_word(id).await?.id),
        None => None,
    };

    let report = app
        .notebook
        .cleanup_contexts(word_id.as_deref(), max)
        .await
        .context("Failed to clean up contexts")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            if !report.changed {
                println!("Nothing to clean up.");
            }
            for detail in &report.details {
                println!("{}: removed {} context(s)", detail.text, detail.removed);
            }
        }
    }
    Ok(())
}
