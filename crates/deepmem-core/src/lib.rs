//! File-backed store of short memory records.
//!
//! Provides:
//! - Record schema with bounded importance and shallow-merged metadata
//! - Whole-document JSON storage with recovery from missing/corrupt files
//! - Keyword search, filtered listing, statistics
//! - Export and merge/replace import

pub mod config;
pub mod error;
pub mod query;
pub mod schema;
pub mod stats;
pub mod storage;
pub mod store;
pub mod transfer;

pub use config::{StoreConfig, default_storage_path};
pub use error::{ErrorKind, Result, StoreError};
pub use query::{Filter, ListOptions, SearchOptions, SortOrder};
pub use schema::{Metadata, NewRecord, Record, RecordPatch};
pub use stats::Stats;
pub use storage::{LoadStatus, Storage};
pub use store::MemoryStore;
pub use transfer::{Export, ImportOptions, ImportSource};
