//! Metadata catalog: the authoritative record of what has been published.

mod sqlite;

pub use sqlite::SqliteCatalog;

use anyhow::{Result, bail};
use std::sync::Arc;

use crate::FileRecord;
use crate::utils::config::PackagePaths;
use crate::utils::CatalogConfig;

/// Storage for [`FileRecord`]s, keyed by `id` with a unique `relative_path`.
///
/// Workers call into the catalog concurrently for distinct paths; implementations must be
/// safe to share behind an `Arc`.
pub trait MetadataCatalog: Send + Sync {
    /// Insert a new record. Fails if its `id` or `relative_path` is already present.
    fn add(&self, record: &FileRecord) -> Result<()>;

    /// Overwrite every mutable field of the record with the same `id`. Fails if none exists.
    fn update(&self, record: &FileRecord) -> Result<()>;

    fn get_by_path(&self, relative_path: &str) -> Result<Option<FileRecord>>;

    fn list_all(&self) -> Result<Vec<FileRecord>>;

    fn delete(&self, record: &FileRecord) -> Result<()>;
}

/// WAL tuning pragmas (synchronous, autocheckpoint, size limit). Use after PRAGMA journal_mode = WAL.
pub(crate) const WAL_PRAGMAS: &str = r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 10000;
        PRAGMA journal_size_limit = 67108864;
        "#;

/// Schema for the files table.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id TEXT PRIMARY KEY,
    relative_path TEXT NOT NULL,
    last_modified_ns INTEGER NOT NULL,
    content_hash BLOB NOT NULL,
    cache_control TEXT NOT NULL,
    content_type TEXT NOT NULL,
    status TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_files_relative_path ON files(relative_path);
"#;

pub(crate) const SELECT_COLUMNS: &str =
    "id, relative_path, last_modified_ns, content_hash, cache_control, content_type, status";

/// Open the catalog backend named by `config.kind`.
pub fn open_catalog(config: &CatalogConfig) -> Result<Arc<dyn MetadataCatalog>> {
    match config.kind.as_str() {
        "sqlite" => {
            let path = config
                .path
                .clone()
                .unwrap_or_else(|| PackagePaths::get().catalog_filename().into());
            Ok(Arc::new(SqliteCatalog::open(&path)?))
        }
        "memory" => Ok(Arc::new(SqliteCatalog::open_in_memory()?)),
        other => bail!("unsupported metadb type: {other:?}"),
    }
}
