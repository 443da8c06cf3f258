//! Change detector: walk the tree, decide what each file needs, feed the task queue, then sweep.

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::Receiver;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use uuid::Uuid;

use crate::engine::catalog::MetadataCatalog;
use crate::engine::hashing::{hash_file, hash_to_hex};
use crate::engine::tools::{guess_content_type, mtime_ns, path_relative_to, path_to_db_string};
use crate::rules::CacheControlRules;
use crate::{FileRecord, SyncStatus, Task};

use super::context::{PipelineContext, create_path_channel};
use super::queue::QueueProducer;
use super::walk::spawn_walk_thread;

/// What the scan observed for one local file.
#[derive(Clone, Debug)]
pub struct Observation {
    pub relative_path: String,
    pub last_modified_ns: i64,
    pub content_hash: [u8; 32],
    /// Only used when the path is new to the catalog.
    pub content_type: String,
}

/// Decide the task for one observed file given its catalog record, if any.
///
/// - no record: new record, `pending-upload`
/// - hash differs: refresh hash, mtime and header, `pending-upload`
/// - hash equal, header recomputes differently: `pending-update`
/// - otherwise: `synced` (re-affirms the record over the mark phase)
pub fn reconcile(
    existing: Option<FileRecord>,
    observed: Observation,
    rules: &CacheControlRules,
    now_ns: i64,
) -> Task {
    let Some(mut record) = existing else {
        let cache_control =
            rules.evaluate(&observed.content_type, observed.last_modified_ns, now_ns);
        return Task::new(FileRecord {
            id: Uuid::new_v4().to_string(),
            relative_path: observed.relative_path,
            last_modified_ns: observed.last_modified_ns,
            content_hash: observed.content_hash,
            cache_control,
            content_type: observed.content_type,
            status: SyncStatus::PendingUpload,
        });
    };

    if record.content_hash != observed.content_hash {
        record.content_hash = observed.content_hash;
        record.last_modified_ns = observed.last_modified_ns;
        record.cache_control =
            rules.evaluate(&record.content_type, record.last_modified_ns, now_ns);
        record.status = SyncStatus::PendingUpload;
    } else {
        let cache_control = rules.evaluate(&record.content_type, record.last_modified_ns, now_ns);
        if cache_control != record.cache_control {
            record.cache_control = cache_control;
            record.status = SyncStatus::PendingUpdate;
        } else {
            record.status = SyncStatus::Synced;
        }
    }
    Task::existing(record)
}

/// Counters from the scan and sweep.
#[derive(Clone, Debug, Default)]
pub struct ScanSummary {
    /// Files handed to the scan workers by the walk.
    pub walked: usize,
    /// Tasks enqueued by the scan workers.
    pub enqueued: usize,
    /// Records enqueued for deletion by the sweep.
    pub swept: usize,
    /// Paths skipped by the walk or the scan.
    pub skipped: usize,
}

/// Everything a scan worker needs to decide one file.
struct Scanner {
    ctx: PipelineContext,
    catalog: Arc<dyn MetadataCatalog>,
    rules: Arc<CacheControlRules>,
    now_ns: i64,
}

impl Scanner {
    fn relative_key(&self, abs_path: &Path) -> Result<String> {
        let rel = path_relative_to(abs_path, &self.ctx.root)
            .ok_or_else(|| anyhow!("{} is outside the sync root", abs_path.display()))?;
        Ok(path_to_db_string(&rel))
    }

    fn scan_file(&self, abs_path: &Path) -> Result<Task> {
        let relative_path = self.relative_key(abs_path)?;
        // Claimed before any I/O: a file that exists but cannot be read this pass keeps its blob.
        self.ctx.claim(&relative_path);

        let existing = self.catalog.get_by_path(&relative_path)?;
        let last_modified_ns = mtime_ns(abs_path)?;
        let content_hash = hash_file(abs_path).context("hash file")?;
        let observed = Observation {
            content_type: guess_content_type(abs_path),
            relative_path,
            last_modified_ns,
            content_hash,
        };
        let task = reconcile(existing, observed, &self.rules, self.now_ns);
        debug!(
            "{} -> {} ({})",
            task.record.relative_path,
            task.record.status,
            &hash_to_hex(&task.record.content_hash)[..12]
        );
        Ok(task)
    }
}

/// Single scan worker: read paths from path_rx, decide, enqueue. Returns the number enqueued.
fn scan_worker_loop(
    path_rx: Receiver<PathBuf>,
    producer: QueueProducer,
    scanner: Arc<Scanner>,
) -> usize {
    let mut enqueued = 0_usize;
    while let Ok(abs_path) = path_rx.recv() {
        match scanner.scan_file(&abs_path) {
            Ok(task) => {
                if let Err(e) = producer.enqueue(task) {
                    log::error!("{:#}", e);
                    break;
                }
                enqueued += 1;
            }
            Err(e) => scanner.ctx.record_skipped(abs_path, format!("{:#}", e)),
        }
    }
    enqueued
}

fn spawn_scan_workers(
    path_rx: Receiver<PathBuf>,
    producer: &QueueProducer,
    scanner: &Arc<Scanner>,
    num_threads: usize,
) -> Vec<JoinHandle<usize>> {
    (0..num_threads.max(1))
        .map(|_| {
            let path_rx = path_rx.clone();
            let producer = producer.clone();
            let scanner = Arc::clone(scanner);
            thread::spawn(move || scan_worker_loop(path_rx, producer, scanner))
        })
        .collect()
}

pub struct ChangeDetector {
    scanner: Arc<Scanner>,
    workers: usize,
    parallel_walk: bool,
}

impl ChangeDetector {
    pub fn new(
        ctx: PipelineContext,
        catalog: Arc<dyn MetadataCatalog>,
        rules: Arc<CacheControlRules>,
        workers: usize,
        parallel_walk: bool,
        now_ns: i64,
    ) -> Self {
        ChangeDetector {
            scanner: Arc::new(Scanner {
                ctx,
                catalog,
                rules,
                now_ns,
            }),
            workers,
            parallel_walk,
        }
    }

    /// Scan the tree and sweep. `producer` is dropped on return, after the last enqueue,
    /// which tells the dispatcher the scan is complete.
    pub fn run(self, producer: QueueProducer) -> Result<ScanSummary> {
        let channel = create_path_channel();
        let walk_handle = spawn_walk_thread(
            channel.path_tx,
            self.scanner.ctx.clone(),
            self.parallel_walk,
        );
        let worker_handles =
            spawn_scan_workers(channel.path_rx, &producer, &self.scanner, self.workers);

        let walked = walk_handle
            .join()
            .map_err(|_| anyhow!("walk thread panicked"))?;
        let mut enqueued = 0_usize;
        for h in worker_handles {
            enqueued += h.join().map_err(|_| anyhow!("scan worker panicked"))?;
        }
        debug!("Scan done: {} files walked, {} tasks enqueued", walked, enqueued);

        let swept = self.sweep(&producer)?;
        producer.close();

        Ok(ScanSummary {
            walked,
            enqueued,
            swept,
            skipped: self.scanner.ctx.skipped_count(),
        })
    }

    /// Enqueue every record still marked `pending-delete` that the scan did not claim.
    fn sweep(&self, producer: &QueueProducer) -> Result<usize> {
        let ctx = &self.scanner.ctx;
        let records = self
            .scanner
            .catalog
            .list_all()
            .context("list catalog for sweep")?;
        let mut swept = 0_usize;
        for record in records {
            if record.status != SyncStatus::PendingDelete || ctx.is_claimed(&record.relative_path) {
                continue;
            }
            debug!("{} -> {} (sweep)", record.relative_path, record.status);
            producer.enqueue(Task::existing(record))?;
            swept += 1;
        }
        Ok(swept)
    }
}
