//! Record schema shared by the store, storage file and import/export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category used when none (or a blank one) is given.
pub const DEFAULT_CATEGORY: &str = "general";

/// Importance used when none is given.
pub const DEFAULT_IMPORTANCE: u8 = 5;

pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 10;

/// Free-form metadata attached to a record.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A single stored memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier
    pub id: String,

    /// Memory content
    pub content: String,

    /// Tags, in caller order (duplicates are kept)
    #[serde(default)]
    pub tags: Vec<String>,

    /// Category
    #[serde(default = "default_category")]
    pub category: String,

    /// Importance, always within 1..=10
    #[serde(default = "default_importance")]
    pub importance: u8,

    /// Creation timestamp
    #[serde(alias = "created")]
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    #[serde(alias = "updated")]
    pub updated_at: DateTime<Utc>,

    /// Additional metadata
    #[serde(default)]
    pub metadata: Metadata,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_importance() -> u8 {
    DEFAULT_IMPORTANCE
}

/// Optional fields accepted by [`MemoryStore::add`](crate::MemoryStore::add).
#[derive(Debug, Clone, Default)]
pub struct NewRecord {
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub importance: Option<i64>,
    pub metadata: Metadata,
}

impl NewRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set importance (clamped when the record is built).
    pub fn with_importance(mut self, importance: i64) -> Self {
        self.importance = Some(importance);
        self
    }

    /// Set one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub importance: Option<i64>,
    /// Shallow-merged into the existing metadata
    pub metadata: Option<Metadata>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn importance(mut self, importance: i64) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value);
        self
    }

    /// True when the patch would change nothing but `updatedAt`.
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.tags.is_none()
            && self.category.is_none()
            && self.importance.is_none()
            && self.metadata.is_none()
    }
}

/// Clamp any integer into the importance range.
pub fn clamp_importance(value: i64) -> u8 {
    value.clamp(MIN_IMPORTANCE as i64, MAX_IMPORTANCE as i64) as u8
}

/// Blank categories fall back to [`DEFAULT_CATEGORY`].
pub(crate) fn normalize_category(category: Option<String>) -> String {
    match category {
        Some(c) if !c.trim().is_empty() => c,
        _ => default_category(),
    }
}

/// Generate an id that `taken` does not already claim.
///
/// Base-36 creation time in microseconds, with a `-N` suffix on collision.
pub(crate) fn generate_id(now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let base = to_base36(now.timestamp_micros().unsigned_abs());
    if !taken(&base) {
        return base;
    }
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
