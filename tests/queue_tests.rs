//! Task queue: FIFO order, non-blocking dequeue, termination after close.

use bloblog::pipeline::task_queue;
use bloblog::{FileRecord, SyncStatus, Task};
use std::thread;

fn task(path: &str) -> Task {
    Task::new(FileRecord {
        id: format!("id-{path}"),
        relative_path: path.to_string(),
        last_modified_ns: 0,
        content_hash: [0; 32],
        cache_control: String::new(),
        content_type: "text/plain".to_string(),
        status: SyncStatus::PendingUpload,
    })
}

#[test]
fn test_fifo_order_single_producer() {
    let (producer, consumer) = task_queue(16);
    for p in ["a", "b", "c"] {
        producer.enqueue(task(p)).unwrap();
    }
    let order: Vec<String> = std::iter::from_fn(|| consumer.dequeue())
        .map(|t| t.record.relative_path)
        .collect();
    assert_eq!(order, ["a", "b", "c"]);
}

#[test]
fn test_dequeue_empty_does_not_block() {
    let (_producer, consumer) = task_queue(4);
    assert!(consumer.is_empty());
    assert!(consumer.dequeue().is_none());
}

#[test]
fn test_is_empty_tracks_contents() {
    let (producer, consumer) = task_queue(4);
    producer.enqueue(task("a")).unwrap();
    assert!(!consumer.is_empty());
    assert_eq!(consumer.len(), 1);
    consumer.dequeue().unwrap();
    assert!(consumer.is_empty());
}

#[test]
fn test_recv_drains_before_reporting_closed() {
    let (producer, consumer) = task_queue(4);
    producer.enqueue(task("a")).unwrap();
    producer.enqueue(task("b")).unwrap();
    producer.close();
    assert_eq!(consumer.recv().unwrap().record.relative_path, "a");
    assert_eq!(consumer.recv().unwrap().record.relative_path, "b");
    assert!(consumer.recv().is_none());
}

#[test]
fn test_enqueue_fails_without_consumers() {
    let (producer, consumer) = task_queue(4);
    drop(consumer);
    assert!(producer.enqueue(task("a")).is_err());
}

#[test]
fn test_many_consumers_see_every_task_once() {
    // Capacity 1 forces the producer to block on every enqueue.
    let (producer, consumer) = task_queue(1);
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let consumer = consumer.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(t) = consumer.recv() {
                    seen.push(t.record.relative_path);
                }
                seen
            })
        })
        .collect();
    drop(consumer);

    let expected: Vec<String> = (0..500).map(|i| format!("f{i}")).collect();
    for p in &expected {
        producer.enqueue(task(p)).unwrap();
    }
    producer.close();

    let mut seen: Vec<String> = workers
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    seen.sort();
    let mut expected = expected;
    expected.sort();
    assert_eq!(seen, expected);
}
