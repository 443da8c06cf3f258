//! Pipeline context: shared data passed into the walk thread and the scan workers.

use crossbeam_channel::{Receiver, Sender, bounded};
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::SyncOpts;
use crate::engine::tools::compile_excludes;
use crate::utils::config::QueueConsts;

/// Paths that could not be walked or read, with the reason.
pub type SkippedPaths = Arc<Mutex<Vec<(PathBuf, String)>>>;

/// Relative paths the scan has accounted for this pass. Anything not in here is swept.
pub type ClaimedPaths = Arc<Mutex<HashSet<String>>>;

/// Shared context for the walk + scan pipeline. Built once per pass from [`SyncOpts`].
#[derive(Clone)]
pub struct PipelineContext {
    /// Canonical sync root.
    pub root: PathBuf,
    pub catalog_canonical: Option<PathBuf>,
    pub excludes: Arc<Vec<Regex>>,
    pub follow_links: bool,
    pub skipped_paths: SkippedPaths,
    pub claimed: ClaimedPaths,
}

impl PipelineContext {
    pub fn new(root: PathBuf, catalog_canonical: Option<PathBuf>, opts: &SyncOpts) -> Self {
        PipelineContext {
            root,
            catalog_canonical,
            excludes: Arc::new(compile_excludes(&opts.exclude)),
            follow_links: opts.follow_links,
            skipped_paths: Arc::new(Mutex::new(Vec::new())),
            claimed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn record_skipped(&self, path: PathBuf, msg: String) {
        log::warn!("Skipping {}: {}", path.display(), msg);
        if let Ok(mut skipped) = self.skipped_paths.lock() {
            skipped.push((path, msg));
        }
    }

    pub fn claim(&self, relative_path: &str) {
        if let Ok(mut claimed) = self.claimed.lock() {
            claimed.insert(relative_path.to_string());
        }
    }

    pub fn is_claimed(&self, relative_path: &str) -> bool {
        self.claimed
            .lock()
            .map(|c| c.contains(relative_path))
            .unwrap_or(false)
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_paths.lock().map(|s| s.len()).unwrap_or(0)
    }
}

/// Walk → scan worker channel.
pub struct PathChannel {
    pub path_tx: Sender<PathBuf>,
    pub path_rx: Receiver<PathBuf>,
}

pub fn create_path_channel() -> PathChannel {
    let (path_tx, path_rx) = bounded::<PathBuf>(QueueConsts::PATH_CHANNEL_CAP);
    PathChannel { path_tx, path_rx }
}
