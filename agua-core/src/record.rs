//! Records and collections: the unit of storage shared by the cache and
//! the remote document.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding a record's unique identifier.
pub const ID_FIELD: &str = "id";
/// Informational modification timestamp (epoch milliseconds).
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// An ordered sequence of records, replaced as a whole on every write.
pub type Collection = Vec<Record>;

/// A single entity: a JSON object with a string `id` and domain fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates an empty record (no id).
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Creates a record with only an `id`.
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(ID_FIELD.to_string(), Value::String(id.into()));
        Self(map)
    }

    /// Builder-style field setter.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the record id, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.0.get(UPDATED_AT_FIELD).and_then(Value::as_i64)
    }

    pub fn set_updated_at(&mut self, millis: i64) {
        self.0.insert(UPDATED_AT_FIELD.to_string(), Value::from(millis));
    }

    /// Shallow merge: every top-level field of `other` overwrites ours.
    pub fn merge(&mut self, other: &Record) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = Value;

    /// Only JSON objects are records; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// A collection name that cannot be used as a cache file or document key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid collection name: {0:?}")]
pub struct InvalidCollectionName(pub String);

/// Validates a collection name.
///
/// Names are used as file names and as top-level document keys, so they
/// are restricted to lowercase ASCII letters, digits, `_` and `-`, and may
/// not start with `_` (reserved for document metadata) or `-`.
pub fn validate_collection_name(name: &str) -> Result<(), InvalidCollectionName> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');

    if name.is_empty() || !valid_chars || name.starts_with('_') || name.starts_with('-') {
        return Err(InvalidCollectionName(name.to_string()));
    }
    Ok(())
}

/// Returns the first id that appears more than once.
pub fn find_duplicate_id(records: &[Record]) -> Option<&str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(Record::id)
        .find(|id| !seen.insert(*id))
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Next document timestamp: wall clock, but always after `previous`.
pub fn next_stamp(now: i64, previous: Option<i64>) -> i64 {
    match previous {
        Some(prev) if prev >= now => prev + 1,
        _ => now,
    }
}
