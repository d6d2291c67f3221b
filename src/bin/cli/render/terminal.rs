use chrono::{DateTime, Local, TimeZone, Utc};

use wordnest_lib::notebook::NotebookEntry;

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
}

/// Wrap `text` in a color when colors are on
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Format a millisecond timestamp in local time
pub fn format_millis(millis: i64) -> String {
    if millis <= 0 {
        return "never".to_string();
    }
    match Local.timestamp_millis_opt(millis).single() {
        Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        None => millis.to_string(),
    }
}

pub fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string())
}

/// Render one word, optionally with its contexts
pub fn render_entry(entry: &NotebookEntry, show_contexts: bool, use_color: bool) -> Vec<String> {
    let mut lines = Vec::new();

    let short_id: String = entry.id.chars().take(8).collect();
    let translation = if entry.translation.is_empty() {
        paint("-", Color::DIM, use_color)
    } else {
        entry.translation.clone()
    };
    lines.push(format!(
        "{}  {}  {}  ({} context{})",
        paint(&short_id, Color::DIM, use_color),
        paint(&entry.text, Color::BOLD, use_color),
        translation,
        entry.contexts.len(),
        if entry.contexts.len() == 1 { "" } else { "s" },
    ));

    if !entry.note.is_empty() {
        lines.push(format!("    {} {}", paint("note:", Color::YELLOW, use_color), entry.note));
    }

    if show_contexts {
        for context in &entry.contexts {
            let id: String = context.id.as_deref().unwrap_or("").chars().take(8).collect();
            lines.push(format!(
                "    {} \"{}\" {}",
                paint(&id, Color::DIM, use_color),
                context.sentence.trim(),
                paint(&format_millis(context.timestamp), Color::DIM, use_color),
            ));
            if !context.url.is_empty() {
                lines.push(format!("             {}", paint(&context.url, Color::CYAN, use_color)));
            }
        }
    }

    lines
}
