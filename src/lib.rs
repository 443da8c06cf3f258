//! bloblog: publish a local directory tree to a blob store.
//!
//! A pass marks every catalog record `pending-delete`, walks the tree and re-claims what still
//! exists (uploading new or changed content, refreshing stale Cache-Control headers), then deletes
//! whatever stayed marked. Scan and dispatch run concurrently, joined by a bounded task queue.

pub mod engine;
pub mod pipeline;
pub mod rules;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use std::sync::Arc;

use engine::{BlobStore, MetadataCatalog};
use rules::CacheControlRules;

/// Result alias used by public bloblog API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: reconcile `opts.root` against `store`, keeping `catalog` authoritative.
///
/// Bring your own collaborators (any [`MetadataCatalog`] / [`BlobStore`]); the CLI builds them from
/// the config file with [`engine::open_catalog`] and [`engine::open_store`].
///
/// ```ignore
/// let catalog = Arc::new(bloblog::engine::SqliteCatalog::open(Path::new(".bloblog.db"))?);
/// let store = Arc::new(bloblog::engine::LocalBlobStore::new("/srv/bucket")?);
/// let report = bloblog::sync_dir(&SyncOpts::new("public"), &rules, catalog, store)?;
/// ```
pub fn sync_dir(
    opts: &SyncOpts,
    rules: &CacheControlRules,
    catalog: Arc<dyn MetadataCatalog>,
    store: Arc<dyn BlobStore>,
) -> Result<PassReport> {
    pipeline::run_pass(opts, rules, catalog, store)
}
