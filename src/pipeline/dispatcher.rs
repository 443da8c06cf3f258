//! Dispatcher: drain the task queue concurrently and apply each record's transition.

use anyhow::{Context, Result, anyhow};
use log::{debug, error};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::engine::catalog::MetadataCatalog;
use crate::engine::progress::TaskCounter;
use crate::engine::store::{BlobMeta, BlobStore};
use crate::{PassReport, SyncStatus, Task};

use super::queue::QueueConsumer;

/// What a successful task did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Uploaded,
    Updated,
    Deleted,
    Confirmed,
}

impl Outcome {
    fn record(self, report: &mut PassReport) {
        match self {
            Outcome::Uploaded => report.uploaded += 1,
            Outcome::Updated => report.updated += 1,
            Outcome::Deleted => report.deleted += 1,
            Outcome::Confirmed => report.confirmed += 1,
        }
    }
}

/// Shared by all dispatch workers.
struct Executor {
    root: PathBuf,
    catalog: Arc<dyn MetadataCatalog>,
    store: Arc<dyn BlobStore>,
}

impl Executor {
    /// Run one record's transition. Store failures return early, before the catalog is written,
    /// so the record keeps its pre-operation catalog state and the next pass retries it.
    fn process_task(&self, task: Task) -> Result<Outcome> {
        let Task {
            mut record,
            new_record,
        } = task;
        let key = record.relative_path.clone();
        match record.status {
            SyncStatus::PendingUpload => {
                let source = self.root.join(&key);
                self.store
                    .put(&key, &source, &BlobMeta::from(&record))
                    .context("store put")?;
                record.status = SyncStatus::Synced;
                if new_record {
                    self.catalog.add(&record).context("catalog add")?;
                } else {
                    self.catalog.update(&record).context("catalog update")?;
                }
                Ok(Outcome::Uploaded)
            }
            SyncStatus::PendingDelete => {
                self.store.delete(&key).context("store delete")?;
                self.catalog.delete(&record).context("catalog delete")?;
                Ok(Outcome::Deleted)
            }
            SyncStatus::PendingUpdate => {
                self.store
                    .replace_metadata(&key, &BlobMeta::from(&record))
                    .context("store replace_metadata")?;
                record.status = SyncStatus::Synced;
                self.catalog.update(&record).context("catalog update")?;
                Ok(Outcome::Updated)
            }
            SyncStatus::Synced => {
                self.catalog.update(&record).context("catalog update")?;
                Ok(Outcome::Confirmed)
            }
        }
    }
}

fn dispatch_worker_loop(
    consumer: QueueConsumer,
    executor: Arc<Executor>,
    progress: Option<TaskCounter>,
) -> PassReport {
    let mut report = PassReport::default();
    while let Some(task) = consumer.recv() {
        let path = task.record.relative_path.clone();
        let status = task.record.status;
        match executor.process_task(task) {
            Ok(outcome) => {
                debug!("{}: {} -> {:?}", path, status, outcome);
                outcome.record(&mut report);
            }
            Err(e) => {
                error!("{} ({}): {:#}", path, status, e);
                report.failed += 1;
            }
        }
        if let Some(counter) = &progress {
            counter.tick();
        }
    }
    report
}

pub struct Dispatcher {
    executor: Arc<Executor>,
    workers: usize,
    verbose: bool,
}

impl Dispatcher {
    pub fn new(
        root: PathBuf,
        catalog: Arc<dyn MetadataCatalog>,
        store: Arc<dyn BlobStore>,
        workers: usize,
    ) -> Self {
        Dispatcher {
            executor: Arc::new(Executor {
                root,
                catalog,
                store,
            }),
            workers,
            verbose: false,
        }
    }

    /// Show a kdam counter while draining.
    pub fn with_progress(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn spawn_workers(
        &self,
        consumer: &QueueConsumer,
        progress: &Option<TaskCounter>,
    ) -> Vec<JoinHandle<PassReport>> {
        (0..self.workers.max(1))
            .map(|_| {
                let consumer = consumer.clone();
                let executor = Arc::clone(&self.executor);
                let progress = progress.clone();
                thread::spawn(move || dispatch_worker_loop(consumer, executor, progress))
            })
            .collect()
    }

    /// Drain the queue until the producer closes it and it is empty. Individual failures are
    /// counted, never fatal.
    pub fn run(&self, consumer: QueueConsumer) -> Result<PassReport> {
        let progress = self.verbose.then(|| TaskCounter::new("Dispatching"));
        let handles = self.spawn_workers(&consumer, &progress);
        drop(consumer);

        let mut report = PassReport::default();
        for h in handles {
            let worker_report = h.join().map_err(|_| anyhow!("dispatch worker panicked"))?;
            report.merge(&worker_report);
        }
        if let Some(counter) = &progress {
            counter.finish(report.mutations() + report.confirmed + report.failed);
        }
        Ok(report)
    }
}
