use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

/// Gzip-compressed full snapshot on the remote
pub const DATA_FILE_NAME: &str = "notebook.json.gz";
/// Plain JSON pointer to the remote snapshot's timestamp
pub const META_FILE_NAME: &str = "meta.json";

/// Sync configuration, stored under the `sync_settings` key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Whether scheduled syncs run
    #[serde(default)]
    pub enabled: bool,
    /// WebDAV server URL (e.g., "https://dav.example.com/dav/")
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub username: String,
    /// May be the empty string, but must be present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Periodic sync interval in minutes
    #[serde(
        default,
        deserialize_with = "deserialize_interval",
        skip_serializing_if = "Option::is_none"
    )]
    pub auto_sync_interval_min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_status: Option<String>,
    /// Keys written by other surfaces that the engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Credentials for WebDAV authentication
#[derive(Debug, Clone)]
pub struct SyncCredentials {
    pub username: String,
    pub password: String,
}

impl SyncSettings {
    /// Check the fields a sync attempt needs and hand back the credentials.
    pub fn validate(&self) -> Result<SyncCredentials, String> {
        if self.server_url.trim().is_empty() {
            return Err("server URL must not be empty".to_string());
        }
        if self.username.trim().is_empty() {
            return Err("username must not be empty".to_string());
        }
        let Some(password) = &self.password else {
            return Err("password is not set".to_string());
        };

        Ok(SyncCredentials {
            username: self.username.clone(),
            password: password.clone(),
        })
    }

    /// Period of the auto-sync alarm, if one should be armed
    pub fn periodic_interval(&self) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        match self.auto_sync_interval_min {
            // An interval too large to represent arms nothing
            Some(minutes) if minutes > 0 => minutes.checked_mul(60).map(Duration::from_secs),
            _ => None,
        }
    }
}

/// Outcome persisted in `last_sync_status`
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    Success,
    Error(String),
}

impl SyncStatus {
    /// Stamp the outcome onto stored settings, leaving every other key as
    /// it is, readable or not.
    pub fn record_on(&self, settings: &mut Map<String, Value>, time: DateTime<Utc>) {
        settings.insert(
            "last_sync_time".to_string(),
            Value::String(time.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        settings.insert("last_sync_status".to_string(), Value::String(self.to_string()));
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// Contents of `meta.json`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemoteMeta {
    pub update_timestamp: i64,
}

/// The whole notebook plus its logical timestamp, transferred as one unit.
///
/// Entries are kept as raw JSON: the engine moves snapshots around without
/// interpreting or rewriting their content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub update_timestamp: i64,
    pub notebook: Vec<Value>,
}

impl RemoteMeta {
    /// A usable pointer needs a non-zero timestamp; anything else means
    /// "unknown" and sends the caller to the full snapshot.
    pub fn from_json(value: &Value) -> Option<Self> {
        let update_timestamp = timestamp_field(value)?;
        (update_timestamp != 0).then_some(Self { update_timestamp })
    }

    pub fn to_json(&self) -> Value {
        json!({ "update_timestamp": self.update_timestamp })
    }
}

impl Snapshot {
    /// Validate a downloaded snapshot, which must carry both a `notebook`
    /// array and a numeric `update_timestamp`.
    pub fn from_json(value: Value) -> Result<Self, String> {
        let update_timestamp = timestamp_field(&value)
            .ok_or_else(|| "remote snapshot has no update_timestamp".to_string())?;

        let notebook = match value {
            Value::Object(mut map) => match map.remove("notebook") {
                Some(Value::Array(entries)) => entries,
                _ => return Err("remote snapshot has no notebook array".to_string()),
            },
            _ => return Err("remote snapshot is not a JSON object".to_string()),
        };

        Ok(Self {
            update_timestamp,
            notebook,
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "update_timestamp": self.update_timestamp,
            "notebook": self.notebook,
        })
    }
}

fn timestamp_field(value: &Value) -> Option<i64> {
    match value.get("update_timestamp")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

/// The options page stored the interval as a string; accept both forms and
/// read a string the way `parseInt` would.
fn deserialize_interval<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    })
}
