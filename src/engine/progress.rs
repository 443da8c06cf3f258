//! Running counter of finished tasks, shown while the dispatcher drains the queue (verbose only).

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

/// Shared by every dispatch worker. The total is unknown up front because the scan is still
/// producing, so the bar counts without a percentage.
#[derive(Clone)]
pub struct TaskCounter {
    bar: Arc<Mutex<Bar>>,
}

impl TaskCounter {
    pub fn new(desc: &'static str) -> Self {
        TaskCounter {
            bar: Arc::new(Mutex::new(kdam::tqdm!(
                total = 0,
                desc = desc,
                animation = Animation::Classic,
                position = 0,
                unit = " tasks"
            ))),
        }
    }

    /// Count one finished task. Skipped when another worker holds the bar; `finish` catches up.
    pub fn tick(&self) {
        if let Ok(mut bar) = self.bar.try_lock() {
            let _ = bar.update(1);
        }
    }

    /// Redraw with the final count and end the line.
    pub fn finish(&self, finished: usize) {
        if let Ok(mut bar) = self.bar.lock() {
            bar.counter = finished;
            let _ = bar.refresh();
            eprintln!();
        }
    }
}
