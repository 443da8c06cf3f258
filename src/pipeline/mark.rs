//! Mark phase: provisionally flag every catalog record for deletion before the scan.

use anyhow::{Context, Result};
use log::debug;

use crate::SyncStatus;
use crate::engine::catalog::MetadataCatalog;

/// Set every record to `pending-delete` and persist it. The scan re-claims what still exists;
/// whatever stays marked is swept. Returns the number of records in the catalog.
pub fn mark_all_pending_delete(catalog: &dyn MetadataCatalog) -> Result<usize> {
    let records = catalog.list_all().context("list catalog for mark phase")?;
    let total = records.len();
    let mut written = 0_usize;
    for mut record in records {
        if record.status == SyncStatus::PendingDelete {
            continue;
        }
        record.status = SyncStatus::PendingDelete;
        catalog.update(&record)?;
        written += 1;
    }
    debug!("Mark phase: {} records, {} re-marked pending-delete", total, written);
    Ok(total)
}
