use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A saved word with the sentences it was seen in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub translation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contexts: Vec<Context>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub note: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: Stats,
    /// Fields written by other clients, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where a word was encountered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// Older notebooks have contexts without ids; they are assigned on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sentence: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub favicon: String,
    /// Milliseconds since the epoch
    #[serde(default, deserialize_with = "lenient_millis")]
    pub timestamp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default, deserialize_with = "lenient_millis")]
    pub created_at: i64,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub updated_at: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub review_count: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotebookEntry {
    /// Case-insensitive match on trimmed text
    pub fn matches_text(&self, text: &str) -> bool {
        self.text.trim().to_lowercase() == text.trim().to_lowercase()
    }
}

/// A word captured from a page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordInput {
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub context: Option<ContextInput>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextInput {
    pub sentence: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub favicon: String,
}

/// Result of [`NotebookApi::cleanup_contexts`](super::NotebookApi::cleanup_contexts)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupReport {
    pub changed: bool,
    pub details: Vec<CleanupDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupDetail {
    pub text: String,
    pub removed: usize,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Millisecond timestamps may have been written as floats or be missing
fn lenient_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(crate::storage::timestamp_from(value.as_ref()))
}
