//! One reconciliation pass: mark the catalog, then scan and dispatch concurrently, then report.

use anyhow::{Result, anyhow};
use log::{debug, info};
use std::sync::Arc;
use std::thread;

use crate::engine::catalog::MetadataCatalog;
use crate::engine::store::BlobStore;
use crate::engine::tools::{canonicalize_paths, now_ns};
use crate::pipeline::{
    ChangeDetector, Dispatcher, PipelineContext, mark_all_pending_delete, task_queue,
};
use crate::rules::CacheControlRules;
use crate::utils::Colors;
use crate::{PassReport, SyncOpts};

/// One reconciliation pass, with cache-control ages measured from the wall clock.
pub fn run_pass(
    opts: &SyncOpts,
    rules: &CacheControlRules,
    catalog: Arc<dyn MetadataCatalog>,
    store: Arc<dyn BlobStore>,
) -> Result<PassReport> {
    run_pass_at(opts, rules, catalog, store, now_ns())
}

/// One reconciliation pass with ages measured from `now_ns`.
///
/// Mark → (scan ‖ dispatch) → join. The detector runs on its own thread and closes the task
/// queue after its last enqueue (scan and sweep); the dispatcher workers run until the queue
/// is closed and drained. Per-record failures are counted in the report, not returned.
pub fn run_pass_at(
    opts: &SyncOpts,
    rules: &CacheControlRules,
    catalog: Arc<dyn MetadataCatalog>,
    store: Arc<dyn BlobStore>,
    now_ns: i64,
) -> Result<PassReport> {
    let (root, catalog_canonical) = canonicalize_paths(&opts.root, opts.catalog_path.as_deref())?;
    debug!("Syncing {} with {} workers", root.display(), opts.workers);

    let marked = mark_all_pending_delete(catalog.as_ref())?;

    let ctx = PipelineContext::new(root.clone(), catalog_canonical, opts);
    let (producer, consumer) = task_queue(opts.queue_capacity);

    let detector = ChangeDetector::new(
        ctx,
        Arc::clone(&catalog),
        Arc::new(rules.clone()),
        opts.workers,
        opts.parallel_walk,
        now_ns,
    );
    let detector_handle = thread::spawn(move || detector.run(producer));

    let dispatched = Dispatcher::new(root, catalog, store, opts.workers)
        .with_progress(opts.verbose)
        .run(consumer);

    let scan = detector_handle
        .join()
        .map_err(|_| anyhow!("change detector thread panicked"))??;
    let mut report = dispatched?;
    report.skipped += scan.skipped;

    debug!(
        "Pass: {} catalogued, {} walked, {} enqueued, {} swept",
        marked, scan.walked, scan.enqueued, scan.swept
    );
    log_summary(&report);
    Ok(report)
}

fn log_summary(report: &PassReport) {
    if report.mutations() == 0 && report.failed == 0 {
        info!("Up to date ({} unchanged).", report.confirmed);
    } else {
        info!(
            "{} | {} | {} | unchanged: {}",
            Colors::colorize(Colors::UPLOADED, &format!("Uploaded: {}", report.uploaded)),
            Colors::colorize(Colors::UPDATED, &format!("Updated: {}", report.updated)),
            Colors::colorize(Colors::DELETED, &format!("Deleted: {}", report.deleted)),
            report.confirmed
        );
    }
    if report.failed > 0 {
        log::warn!(
            "{}; they will be retried on the next run",
            Colors::colorize(Colors::FAILED, &format!("{} operations failed", report.failed))
        );
    }
    if report.skipped > 0 {
        log::warn!(
            "Skipped {} paths due to permission errors or access issues",
            report.skipped
        );
    }
}
