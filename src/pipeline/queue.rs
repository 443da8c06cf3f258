//! Task queue between the change detector (one producer) and the dispatcher workers.
//!
//! Backed by a bounded crossbeam channel: a full queue blocks the scan instead of growing
//! without limit, and an empty queue parks the workers instead of spinning. Dropping the
//! producer is the "scan complete" signal. Crossbeam delivers every message sent before the
//! drop, so a consumer that sees the channel disconnected has already drained it.

use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};

use crate::Task;

/// Create a queue holding at most `capacity` tasks.
pub fn task_queue(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let (tx, rx) = bounded::<Task>(capacity.max(1));
    (QueueProducer { tx }, QueueConsumer { rx })
}

#[derive(Clone)]
pub struct QueueProducer {
    tx: Sender<Task>,
}

impl QueueProducer {
    /// Append a task, waiting while the queue is full. Fails only if every consumer is gone.
    pub fn enqueue(&self, task: Task) -> Result<()> {
        self.tx.send(task).map_err(|e| {
            anyhow!(
                "task queue closed before {} could be enqueued",
                e.0.record.relative_path
            )
        })
    }

    /// Signal that no more tasks will be enqueued. The queue closes once every clone is closed or dropped.
    pub fn close(self) {
        drop(self);
    }
}

#[derive(Clone)]
pub struct QueueConsumer {
    rx: Receiver<Task>,
}

impl QueueConsumer {
    /// Oldest task, or `None` right away if nothing is queued.
    pub fn dequeue(&self) -> Option<Task> {
        match self.rx.try_recv() {
            Ok(task) => Some(task),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Tasks currently buffered.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Next task, waiting for one if needed. `None` once the producer is closed and the queue is drained.
    pub fn recv(&self) -> Option<Task> {
        self.rx.recv().ok()
    }
}
