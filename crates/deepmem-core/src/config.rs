//! Store configuration and default path resolution.
//!
//! The store never looks at the environment itself; callers resolve a path
//! here (or elsewhere) and pass it in through [`StoreConfig`].

use camino::Utf8PathBuf;

/// Environment variable overriding the default storage path.
pub const STORAGE_ENV: &str = "DEEPMEM_STORAGE";

const DATA_DIR: &str = ".deepmem";
const DATA_FILE: &str = "memories.json";

/// Settings fixed for the lifetime of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path to the JSON storage file
    pub path: Utf8PathBuf,
}

impl StoreConfig {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Configuration using [`default_storage_path`].
    pub fn from_env() -> Self {
        Self::new(default_storage_path())
    }
}

/// Get default storage path.
///
/// Priority:
/// 1. DEEPMEM_STORAGE environment variable (if set and non-empty)
/// 2. ~/.deepmem/memories.json
/// 3. .deepmem/memories.json relative to the working directory
pub fn default_storage_path() -> Utf8PathBuf {
    if let Ok(custom) = std::env::var(STORAGE_ENV)
        && !custom.trim().is_empty()
    {
        return Utf8PathBuf::from(custom);
    }
    resolve_default(dirs::home_dir().and_then(|h| Utf8PathBuf::from_path_buf(h).ok()))
}

fn resolve_default(home: Option<Utf8PathBuf>) -> Utf8PathBuf {
    match home {
        Some(home) => home.join(DATA_DIR).join(DATA_FILE),
        None => Utf8PathBuf::from(DATA_DIR).join(DATA_FILE),
    }
}
