//! Blob store: where published content lives. Keys are catalog relative paths.

mod local;
mod memory;

pub use local::LocalBlobStore;
pub use memory::{MemoryBlobStore, StoreCalls};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::FileRecord;
use crate::utils::StorageConfig;

/// Headers stored alongside a blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMeta {
    pub cache_control: String,
    pub content_type: String,
    /// Catalog id of the record that owns the blob.
    pub id: String,
}

impl From<&FileRecord> for BlobMeta {
    fn from(record: &FileRecord) -> Self {
        BlobMeta {
            cache_control: record.cache_control.clone(),
            content_type: record.content_type.clone(),
            id: record.id.clone(),
        }
    }
}

/// Object storage operations the dispatcher needs.
///
/// Each call is independent; the dispatcher never issues two calls for the same key at once.
pub trait BlobStore: Send + Sync {
    /// Upload the file at `source` under `key` with the given headers.
    fn put(&self, key: &str, source: &Path, meta: &BlobMeta) -> Result<()>;

    /// Remove the blob at `key`. Removing a missing blob is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Replace the headers of an existing blob without transferring content.
    fn replace_metadata(&self, key: &str, meta: &BlobMeta) -> Result<()>;
}

/// Open the blob store backend named by `config.kind`.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.kind.as_str() {
        "local" => {
            let path = config
                .path
                .as_deref()
                .context("[deployment.storage] type \"local\" needs a path")?;
            Ok(Arc::new(LocalBlobStore::new(path)?))
        }
        "memory" => Ok(Arc::new(MemoryBlobStore::default())),
        other => bail!("unsupported storage type: {other:?}"),
    }
}
