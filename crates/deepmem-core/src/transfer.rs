//! Bulk export/import payloads.
//!
//! Import accepts the storage file format or a bare array of partial
//! records; missing fields get the same defaults as `add`.

use crate::error::{Result, StoreError};
use crate::schema::{
    DEFAULT_IMPORTANCE, Metadata, Record, clamp_importance, generate_id, normalize_category,
};
use crate::storage;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Where import data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Path(Utf8PathBuf),
    Text(String),
}

impl ImportSource {
    /// Treat `input` as a path when a file exists there, otherwise as JSON text.
    pub fn detect(input: &str) -> Self {
        let path = Utf8Path::new(input);
        if path.is_file() {
            Self::Path(path.to_path_buf())
        } else {
            Self::Text(input.to_string())
        }
    }

    pub(crate) fn read(&self) -> Result<String> {
        match self {
            Self::Path(path) => storage::read_file(path),
            Self::Text(text) => Ok(text.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Skip incoming records whose id already exists instead of replacing
    /// the whole collection.
    pub merge: bool,
}

/// Outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Export {
    /// Written to this path.
    Written(Utf8PathBuf),
    /// No path given; the serialized collection.
    Text(String),
}

/// One incoming record before defaults are applied.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tags: Option<Value>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    importance: Option<Value>,
    #[serde(default, alias = "created")]
    created_at: Option<String>,
    #[serde(default, alias = "updated")]
    updated_at: Option<String>,
    #[serde(default)]
    metadata: Option<Metadata>,
}

/// Parse raw import text into candidates. The top level must be an array of
/// objects.
pub(crate) fn parse_candidates(text: &str) -> Result<Vec<Candidate>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::validation(format!("import data is not valid JSON: {e}")))?;

    let Value::Array(items) = value else {
        return Err(StoreError::validation(
            "import data must be an array of records",
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(StoreError::validation(format!(
                    "record {index}: expected an object"
                )));
            }
            serde_json::from_value(item)
                .map_err(|e| StoreError::validation(format!("record {index}: {e}")))
        })
        .collect()
}

impl Candidate {
    /// The id the candidate brings along, if any.
    pub fn provided_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Apply `add` defaults. `taken` reports ids that a generated id must avoid.
    pub fn into_record(
        self,
        index: usize,
        now: DateTime<Utc>,
        taken: impl Fn(&str) -> bool,
    ) -> Result<Record> {
        let err = |msg: &str| StoreError::validation(format!("record {index}: {msg}"));

        let content = match self.content {
            Some(c) if !c.trim().is_empty() => c,
            _ => return Err(err("content is required")),
        };

        let importance = match self.importance {
            None | Some(Value::Null) => DEFAULT_IMPORTANCE,
            Some(Value::Number(n)) => {
                let value = n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f.round() as i64))
                    .ok_or_else(|| err("importance is out of range"))?;
                clamp_importance(value)
            }
            Some(_) => return Err(err("importance must be a number")),
        };

        let created_at = match self.created_at.as_deref() {
            Some(s) => parse_timestamp(s)
                .ok_or_else(|| err("createdAt is not an RFC 3339 timestamp"))?,
            None => now,
        };
        let updated_at = match self.updated_at.as_deref() {
            Some(s) => parse_timestamp(s)
                .ok_or_else(|| err("updatedAt is not an RFC 3339 timestamp"))?,
            None => now,
        };

        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => generate_id(now, taken),
        };

        Ok(Record {
            id,
            content,
            tags: tags_from(self.tags),
            category: normalize_category(self.category),
            importance,
            created_at,
            updated_at: updated_at.max(created_at),
            metadata: self.metadata.unwrap_or_default(),
        })
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Arrays keep their string entries; anything else becomes no tags.
fn tags_from(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Serialize a collection for export.
pub(crate) fn to_json(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
