mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wordnest-cli", about = "Vocabulary notebook with WebDAV sync", version)]
struct Cli {
    /// Data directory (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Sync the notebook with the WebDAV server
    Sync {
        /// Run even when sync is disabled
        #[arg(long)]
        force: bool,
    },

    /// Show sync settings and the last sync result
    Status,

    /// Test the connection to the configured server
    Check,

    /// Change sync settings
    Configure {
        /// WebDAV server URL
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        username: Option<String>,
        /// Password (use "-" to read from stdin)
        #[arg(long)]
        password: Option<String>,
        /// Auto-sync interval in minutes (0 turns it off)
        #[arg(long)]
        interval: Option<u64>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },

    /// Save a word, or add a context to a saved one
    Add {
        word: String,
        /// Sentence the word was seen in
        #[arg(long)]
        sentence: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        translation: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },

    /// List saved words
    List {
        /// Filter by word, translation or note
        #[arg(long)]
        search: Option<String>,
        /// Show contexts under each word
        #[arg(long)]
        contexts: bool,
    },

    /// Replace the note on a word
    Note {
        /// Word id (or unique prefix)
        id: String,
        note: String,
    },

    /// Delete a word
    Delete {
        /// Word id (or unique prefix)
        id: String,
    },

    /// Delete one context from a word
    DeleteContext {
        /// Word id (or unique prefix)
        word_id: String,
        context_id: String,
    },

    /// Deduplicate and trim contexts
    Cleanup {
        /// Only clean this word
        #[arg(long)]
        word: Option<String>,
        /// Contexts to keep per word
        #[arg(long, default_value_t = wordnest_lib::notebook::DEFAULT_MAX_CONTEXTS)]
        max: usize,
    },

    /// Import a Saladict JSON export
    Import {
        file: PathBuf,
    },

    /// Export the notebook as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Delete every word
    Clear {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Run the sync scheduler until interrupted
    Watch,
}

/// Resolve "-" as stdin
fn resolve_secret(value: Option<String>) -> anyhow::Result<Option<String>> {
    match value.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
            Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
        }
        _ => Ok(value),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.data_dir)?;
    let format = &cli.format;

    match cli.command {
        Command::Sync { force } => {
            commands::sync::run(&app, force, format, use_color).await?;
        }
        Command::Status => {
            commands::settings::run_status(&app, format, use_color).await?;
        }
        Command::Check => {
            commands::settings::run_check(&app, format).await?;
        }
        Command::Configure { url, username, password, interval, enable, disable } => {
            let enabled = match (enable, disable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let update = commands::settings::SettingsUpdate {
                server_url: url,
                username,
                password: resolve_secret(password)?,
                interval,
                enabled,
            };
            commands::settings::run_configure(&app, update, format).await?;
        }
        Command::Add { word, sentence, url, title, translation, note } => {
            let input = commands::words::word_input(word, sentence, url, title, translation, note);
            commands::words::run_add(&app, input, format, use_color).await?;
        }
        Command::List { search, contexts } => {
            commands::words::run_list(&app, search.as_deref(), contexts, format, use_color).await?;
        }
        Command::Note { id, note } => {
            commands::words::run_note(&app, &id, &note).await?;
        }
        Command::Delete { id } => {
            commands::words::run_delete(&app, &id).await?;
        }
        Command::DeleteContext { word_id, context_id } => {
            commands::words::run_delete_context(&app, &word_id, &context_id).await?;
        }
        Command::Cleanup { word, max } => {
            commands::words::run_cleanup(&app, word.as_deref(), max, format).await?;
        }
        Command::Import { file } => {
            commands::transfer::run_import(&app, &file, format).await?;
        }
        Command::Export { output } => {
            commands::transfer::run_export(&app, output.as_deref()).await?;
        }
        Command::Clear { yes } => {
            commands::transfer::run_clear(&app, yes).await?;
        }
        Command::Watch => {
            commands::watch::run(&app, format).await?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
