//! The record store: CRUD, queries, bulk transfer.
//!
//! The collection is loaded once when the store is opened and never re-read.
//! Every mutation writes the whole collection back; if that write fails the
//! in-memory collection is restored to its previous state and the error is
//! returned.

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::query::{self, ListOptions, SearchOptions};
use crate::schema::{
    DEFAULT_IMPORTANCE, NewRecord, Record, RecordPatch, clamp_importance, generate_id,
    normalize_category,
};
use crate::stats::Stats;
use crate::storage::{self, LoadStatus, Storage};
use crate::transfer::{self, Export, ImportOptions, ImportSource};
use camino::Utf8Path;
use chrono::Utc;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug)]
pub struct MemoryStore {
    storage: Storage,
    records: Vec<Record>,
    load_status: LoadStatus,
}

impl MemoryStore {
    /// Open the store at the configured path, loading whatever is there.
    pub fn open(config: StoreConfig) -> Self {
        let storage = Storage::new(config.path);
        let loaded = storage.load();
        Self {
            records: sanitize_loaded(loaded.records),
            load_status: loaded.status,
            storage,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        self.storage.path()
    }

    /// How the collection was obtained when the store was opened.
    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    fn save(&self) -> Result<()> {
        self.storage.save(&self.records)
    }

    /// Create a record.
    pub fn add(&mut self, content: impl Into<String>, options: NewRecord) -> Result<Record> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(StoreError::validation("content is required"));
        }

        let now = Utc::now();
        let record = Record {
            id: generate_id(now, |candidate| self.contains(candidate)),
            content,
            tags: options.tags,
            category: normalize_category(options.category),
            importance: options
                .importance
                .map(clamp_importance)
                .unwrap_or(DEFAULT_IMPORTANCE),
            created_at: now,
            updated_at: now,
            metadata: options.metadata,
        };

        self.records.push(record.clone());
        if let Err(e) = self.save() {
            self.records.pop();
            return Err(e);
        }

        tracing::debug!(id = %record.id, "added record");
        Ok(record)
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Apply a partial update. `Ok(None)` when the id is unknown.
    pub fn update(&mut self, id: &str, patch: RecordPatch) -> Result<Option<Record>> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };
        if let Some(content) = &patch.content
            && content.trim().is_empty()
        {
            return Err(StoreError::validation("content must not be empty"));
        }

        let previous = self.records[index].clone();
        let record = &mut self.records[index];
        if let Some(content) = patch.content {
            record.content = content;
        }
        if let Some(tags) = patch.tags {
            record.tags = tags;
        }
        if let Some(category) = patch.category {
            record.category = normalize_category(Some(category));
        }
        if let Some(importance) = patch.importance {
            record.importance = clamp_importance(importance);
        }
        if let Some(metadata) = patch.metadata {
            record.metadata.extend(metadata);
        }
        record.updated_at = Utc::now().max(record.created_at);

        if let Err(e) = self.save() {
            self.records[index] = previous;
            return Err(e);
        }

        tracing::debug!(%id, "updated record");
        Ok(Some(self.records[index].clone()))
    }

    /// Remove a record. `Ok(false)` when the id is unknown.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        let removed = self.records.remove(index);
        if let Err(e) = self.save() {
            self.records.insert(index, removed);
            return Err(e);
        }

        tracing::debug!(%id, "deleted record");
        Ok(true)
    }

    /// Keyword search; see [`query::search`].
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<Record> {
        query::search(&self.records, query, options)
    }

    /// Filtered, sorted, truncated listing; see [`query::list`].
    pub fn list(&self, options: &ListOptions) -> Vec<Record> {
        query::list(&self.records, options)
    }

    /// Distinct tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|r| r.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn stats(&self) -> Stats {
        Stats::compute(&self.records)
    }

    /// Serialize the collection, writing it to `path` when given.
    pub fn export(&self, path: Option<&Utf8Path>) -> Result<Export> {
        let json = transfer::to_json(&self.records)?;
        match path {
            Some(path) => {
                storage::write_file(path, &json)?;
                tracing::debug!(%path, count = self.records.len(), "exported records");
                Ok(Export::Written(path.to_path_buf()))
            }
            None => Ok(Export::Text(json)),
        }
    }

    /// Import records and return how many were added.
    ///
    /// With `merge`, incoming ids that already exist are skipped and the rest
    /// are appended. Without it, the collection is replaced by the incoming
    /// records. Either way a repeated id within the payload keeps its first
    /// occurrence. Nothing is applied if any added record fails validation.
    pub fn import(&mut self, source: ImportSource, options: ImportOptions) -> Result<usize> {
        let text = source.read()?;
        let candidates = transfer::parse_candidates(&text)?;
        let now = Utc::now();

        let mut seen: HashSet<String> = if options.merge {
            self.records.iter().map(|r| r.id.clone()).collect()
        } else {
            HashSet::new()
        };

        let mut incoming = Vec::new();
        for (index, candidate) in candidates.into_iter().enumerate() {
            if let Some(id) = candidate.provided_id()
                && seen.contains(id)
            {
                tracing::debug!(%id, "skipping duplicate id on import");
                continue;
            }
            let record = candidate.into_record(index, now, |id| seen.contains(id))?;
            seen.insert(record.id.clone());
            incoming.push(record);
        }

        let added = incoming.len();
        let next = if options.merge {
            let mut next = self.records.clone();
            next.extend(incoming);
            next
        } else {
            incoming
        };

        self.storage.save(&next)?;
        self.records = next;

        tracing::debug!(added, merge = options.merge, "imported records");
        Ok(added)
    }

    /// Remove every record. Returns how many were removed.
    pub fn clear(&mut self) -> Result<usize> {
        let previous = std::mem::take(&mut self.records);
        if let Err(e) = self.save() {
            self.records = previous;
            return Err(e);
        }

        tracing::debug!(removed = previous.len(), "cleared records");
        Ok(previous.len())
    }
}

/// A hand-edited file may repeat an id; the first occurrence wins.
fn sanitize_loaded(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let fresh = seen.insert(r.id.clone());
            if !fresh {
                tracing::warn!(id = %r.id, "dropping duplicate id from storage file");
            }
            fresh
        })
        .collect()
}
