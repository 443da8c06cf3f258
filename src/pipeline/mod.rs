//! Reconciliation pipeline: mark, scan (walk + decide), task queue, dispatch.

pub mod context;
pub mod detector;
pub mod dispatcher;
pub mod mark;
pub mod orchestrator;
pub mod queue;
pub mod walk;

pub use context::{ClaimedPaths, PathChannel, PipelineContext, SkippedPaths, create_path_channel};
pub use detector::{ChangeDetector, Observation, ScanSummary, reconcile};
pub use dispatcher::{Dispatcher, Outcome};
pub use mark::mark_all_pending_delete;
pub use orchestrator::{run_pass, run_pass_at};
pub use queue::{QueueConsumer, QueueProducer, task_queue};
pub use walk::{WalkOutcome, run_walk_loop, spawn_walk_thread, to_outcome_jwalk, to_outcome_walkdir};
