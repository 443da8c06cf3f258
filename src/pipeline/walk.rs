//! Common walk loop: consumes an iterator of walk outcomes and sends included files to path_tx.

use crossbeam_channel::Sender;
use std::fs::FileType;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crate::engine::tools::should_include_in_walk;

use super::context::PipelineContext;

/// One result from a directory walk.
pub enum WalkOutcome {
    File(PathBuf),
    /// Directories and other non-regular entries.
    NotFile,
    Err { msg: String, path: Option<PathBuf> },
}

/// Regular files, and symlinks (when links are not followed) whose target is a regular file.
/// A dangling link is not a file.
fn is_publishable_file(file_type: FileType, path: &Path) -> bool {
    if file_type.is_file() {
        return true;
    }
    if !file_type.is_symlink() {
        return false;
    }
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file(),
        Err(e) => {
            log::debug!("Ignoring dangling link {}: {}", path.display(), e);
            false
        }
    }
}

/// Convert a jwalk result into [`WalkOutcome`].
pub fn to_outcome_jwalk(r: Result<jwalk::DirEntry<((), ())>, jwalk::Error>) -> WalkOutcome {
    match r {
        Ok(entry) => {
            let path = entry.path();
            if is_publishable_file(entry.file_type(), &path) {
                WalkOutcome::File(path)
            } else {
                WalkOutcome::NotFile
            }
        }
        Err(err) => WalkOutcome::Err {
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        },
    }
}

/// Convert a walkdir result into [`WalkOutcome`].
pub fn to_outcome_walkdir(r: Result<walkdir::DirEntry, walkdir::Error>) -> WalkOutcome {
    match r {
        Ok(entry) if is_publishable_file(entry.file_type(), entry.path()) => {
            WalkOutcome::File(entry.into_path())
        }
        Ok(_) => WalkOutcome::NotFile,
        Err(err) => WalkOutcome::Err {
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        },
    }
}

fn jwalk_iter(ctx: &PipelineContext) -> Box<dyn Iterator<Item = WalkOutcome>> {
    use jwalk::Parallelism;
    use std::time::Duration;
    Box::new(
        jwalk::WalkDir::new(&ctx.root)
            .follow_links(ctx.follow_links)
            .parallelism(Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_secs(60),
            })
            .into_iter()
            .map(to_outcome_jwalk),
    )
}

fn walkdir_iter(ctx: &PipelineContext) -> Box<dyn Iterator<Item = WalkOutcome>> {
    use walkdir::WalkDir;
    Box::new(
        WalkDir::new(&ctx.root)
            .follow_links(ctx.follow_links)
            .into_iter()
            .map(to_outcome_walkdir),
    )
}

pub fn spawn_walk_thread(
    path_tx: Sender<PathBuf>,
    ctx: PipelineContext,
    parallel_walk: bool,
) -> JoinHandle<usize> {
    thread::spawn(move || {
        if parallel_walk {
            log::debug!("Walking in parallel");
        } else {
            log::debug!("Walking serially");
        }
        let iter: Box<dyn Iterator<Item = WalkOutcome>> = match parallel_walk {
            true => jwalk_iter(&ctx),
            false => walkdir_iter(&ctx),
        };
        run_walk_loop(path_tx, &ctx, iter)
    })
}

/// Run the common walk loop: consume `iter`, filter with `should_include_in_walk`, send included
/// files to `path_tx`. Errors are recorded as skipped paths; the walk carries on.
/// Drops `path_tx` when done so the scan workers see the channel close. Returns the count of paths sent.
pub fn run_walk_loop<I>(path_tx: Sender<PathBuf>, ctx: &PipelineContext, iter: I) -> usize
where
    I: Iterator<Item = WalkOutcome>,
{
    let mut count = 0_usize;
    for outcome in iter {
        match outcome {
            WalkOutcome::File(path) => {
                if should_include_in_walk(&path, &ctx.root, &ctx.catalog_canonical, &ctx.excludes)
                {
                    if path_tx.send(path).is_err() {
                        break;
                    }
                    count += 1;
                }
            }
            WalkOutcome::NotFile => {}
            WalkOutcome::Err { msg, path } => {
                let path = path.unwrap_or_else(|| PathBuf::from("<no-path>"));
                ctx.record_skipped(path, msg);
            }
        }
    }
    drop(path_tx);
    count
}
