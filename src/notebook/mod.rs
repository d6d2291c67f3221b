//! The vocabulary notebook: saved words, their contexts and the mutators
//! that keep the sync timestamp moving.

mod api;
mod models;

pub use api::{NotebookApi, NotebookError, Result, DEFAULT_MAX_CONTEXTS};
pub use models::{
    CleanupDetail, CleanupReport, Context, ContextInput, NotebookEntry, Stats, WordInput,
};
