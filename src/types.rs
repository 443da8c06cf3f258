//! Public and internal types for the bloblog API and pipeline.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where a record stands relative to the blob store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    /// Content must be (re)uploaded.
    PendingUpload,
    /// Not seen locally this pass; blob and record are to be removed.
    PendingDelete,
    /// Content unchanged, blob headers must be replaced.
    PendingUpdate,
    Synced,
}

impl SyncStatus {
    /// Name stored in the catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::PendingUpload => "pending-upload",
            SyncStatus::PendingDelete => "pending-delete",
            SyncStatus::PendingUpdate => "pending-update",
            SyncStatus::Synced => "synced",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending-upload" => Ok(SyncStatus::PendingUpload),
            "pending-delete" => Ok(SyncStatus::PendingDelete),
            "pending-update" => Ok(SyncStatus::PendingUpdate),
            "synced" => Ok(SyncStatus::Synced),
            other => Err(anyhow::anyhow!("unrecognized sync status: {other:?}")),
        }
    }
}

/// One tracked file (same shape as a row in the catalog's `files` table).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    /// UUID assigned at first discovery. Never changes afterwards.
    pub id: String,
    /// Path relative to the sync root, `/`-separated. Unique across the catalog.
    pub relative_path: String,
    /// Local modification time in nanoseconds since epoch, from the same observation as `content_hash`.
    pub last_modified_ns: i64,
    /// Blake3 digest of the file contents.
    pub content_hash: [u8; 32],
    pub cache_control: String,
    /// MIME type inferred from the path at discovery.
    pub content_type: String,
    pub status: SyncStatus,
}

/// Unit of work handed from the change detector to the dispatcher.
#[derive(Clone, Debug)]
pub struct Task {
    pub record: FileRecord,
    /// True when the record is not in the catalog yet (first discovery); the dispatcher
    /// adds it instead of updating it once the upload succeeds.
    pub new_record: bool,
}

impl Task {
    pub fn new(record: FileRecord) -> Self {
        Task {
            record,
            new_record: true,
        }
    }

    pub fn existing(record: FileRecord) -> Self {
        Task {
            record,
            new_record: false,
        }
    }
}

/// Counters for one reconciliation pass. Failures are reported here and in the log; they never
/// abort the pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Records whose content was put to the store.
    pub uploaded: usize,
    /// Records whose blob headers were replaced.
    pub updated: usize,
    /// Records removed from store and catalog.
    pub deleted: usize,
    /// Unchanged records re-persisted as `synced`.
    pub confirmed: usize,
    /// Tasks whose store or catalog call failed.
    pub failed: usize,
    /// Local paths skipped because they could not be walked, read or hashed.
    pub skipped: usize,
}

impl PassReport {
    /// Sum of store mutations (put, replace, delete) that succeeded.
    pub fn mutations(&self) -> usize {
        self.uploaded + self.updated + self.deleted
    }

    pub fn merge(&mut self, other: &PassReport) {
        self.uploaded += other.uploaded;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.confirmed += other.confirmed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Resolved runtime options for a pass (config file merged with CLI).
#[derive(Clone, Debug)]
pub struct SyncOpts {
    /// Local directory to publish.
    pub root: PathBuf,
    /// Exclusion patterns (regular expressions matched against the full path).
    pub exclude: Vec<String>,
    /// Worker thread count for both the scan and the dispatch pools.
    pub workers: usize,
    /// Task queue capacity; the scan blocks when the dispatcher falls this far behind.
    pub queue_capacity: usize,
    /// Walk the tree with jwalk (parallel) instead of walkdir (serial).
    pub parallel_walk: bool,
    /// Follow symbolic links.
    pub follow_links: bool,
    /// Show a progress counter while dispatching.
    pub verbose: bool,
    /// Catalog database file; never published when it lives inside `root`.
    pub catalog_path: Option<PathBuf>,
}

impl SyncOpts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SyncOpts {
            root: root.into(),
            exclude: Vec::new(),
            workers: crate::utils::config::WorkerThreadLimits::current().default_workers(),
            queue_capacity: crate::utils::config::QueueConsts::DEFAULT_CAPACITY,
            parallel_walk: false,
            follow_links: false,
            verbose: false,
            catalog_path: None,
        }
    }
}
