//! JSON file storage for the record collection.
//!
//! The whole collection lives in one pretty-printed JSON array. Every save
//! rewrites the file; there is no append log.

use crate::error::{Result, StoreError};
use crate::schema::Record;
use crate::transfer::Candidate;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use tempfile::NamedTempFile;

/// How the collection was obtained at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// File parsed. `skipped` entries could not be turned into records and
    /// were dropped.
    Loaded { count: usize, skipped: usize },
    /// No file at the path yet.
    Missing,
    /// File existed but could not be read or parsed; an empty collection was
    /// substituted. The next save overwrites the file.
    Recovered { reason: String },
}

/// Result of [`Storage::load`].
#[derive(Debug, Clone)]
pub struct Loaded {
    pub records: Vec<Record>,
    pub status: LoadStatus,
}

/// JSON-document storage.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Path to the JSON file
    path: Utf8PathBuf,
}

impl Storage {
    /// Create a new storage instance.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Ensure storage directory exists.
    pub fn ensure_dir(&self) -> Result<()> {
        ensure_parent(&self.path)
    }

    /// Load the collection. Never fails: missing and corrupt files both
    /// yield an empty collection, distinguished by [`LoadStatus`].
    ///
    /// Entries are read with the same lenient rules as import, so an
    /// out-of-range importance or a missing timestamp is repaired rather
    /// than discarding the whole file. Entries that cannot be repaired are
    /// skipped with a warning.
    pub fn load(&self) -> Loaded {
        if !self.path.exists() {
            tracing::debug!(path = %self.path, "storage file missing, starting empty");
            return Loaded {
                records: Vec::new(),
                status: LoadStatus::Missing,
            };
        }

        let parsed = fs::read_to_string(&self.path)
            .map_err(|e| format!("read failed: {e}"))
            .and_then(|text| {
                serde_json::from_str::<Value>(&text).map_err(|e| format!("parse failed: {e}"))
            })
            .and_then(|value| match value {
                Value::Array(items) => Ok(items),
                _ => Err("parse failed: expected an array of records".to_string()),
            });

        match parsed {
            Ok(items) => {
                let total = items.len();
                let records = recover_records(items, Utc::now());
                let skipped = total - records.len();
                tracing::debug!(path = %self.path, count = records.len(), skipped, "loaded records");
                Loaded {
                    status: LoadStatus::Loaded {
                        count: records.len(),
                        skipped,
                    },
                    records,
                }
            }
            Err(reason) => {
                tracing::warn!(path = %self.path, %reason, "storage file unusable, starting empty");
                Loaded {
                    records: Vec::new(),
                    status: LoadStatus::Recovered { reason },
                }
            }
        }
    }

    /// Overwrite the file with the full collection.
    ///
    /// Writes to a temporary file next to the target and renames it over the
    /// target, so readers see either the old or the new document.
    pub fn save(&self, records: &[Record]) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(records)?;
        write_atomic(&self.path, json.as_bytes())?;
        tracing::debug!(path = %self.path, count = records.len(), "saved records");
        Ok(())
    }
}

/// Turn stored entries into records, dropping the ones that cannot be read.
/// Generated ids avoid every id the file already names.
fn recover_records(items: Vec<Value>, now: DateTime<Utc>) -> Vec<Record> {
    let candidates: Vec<(usize, Candidate)> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(candidate) => Some((index, candidate)),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping unreadable stored record");
                None
            }
        })
        .collect();

    let named: HashSet<String> = candidates
        .iter()
        .filter_map(|(_, c)| c.provided_id())
        .map(str::to_string)
        .collect();

    let mut records: Vec<Record> = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates {
        let result = candidate.into_record(index, now, |id| {
            named.contains(id) || records.iter().any(|r| r.id == id)
        });
        match result {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(index, error = %e, "skipping invalid stored record"),
        }
    }
    records
}

fn ensure_parent(path: &Utf8Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| StoreError::storage(parent, e))?;
    }
    Ok(())
}

fn write_atomic(path: &Utf8Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    };
    let to_storage = |e: io::Error| StoreError::storage(path, e);

    let mut tmp = NamedTempFile::new_in(dir).map_err(to_storage)?;
    tmp.write_all(bytes).map_err(to_storage)?;
    tmp.as_file().sync_all().map_err(to_storage)?;
    tmp.persist(path).map_err(|e| to_storage(e.error))?;
    Ok(())
}

/// Write `text` to an arbitrary path, creating parent directories.
pub(crate) fn write_file(path: &Utf8Path, text: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, text).map_err(|e| StoreError::storage(path, e))
}

/// Read an arbitrary file to a string.
pub(crate) fn read_file(path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| StoreError::storage(path, e))
}
