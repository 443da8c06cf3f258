//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;

use super::fd_limit::max_workers_by_fd_limit;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    catalog_filename: String,
    meta_dir_name: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                catalog_filename: format!(".{pkg}.db"),
                meta_dir_name: format!(".{pkg}-meta"),
            }
        })
    }

    /// Default SQLite catalog filename when the config names none.
    pub fn catalog_filename(&self) -> &str {
        &self.catalog_filename
    }

    /// Directory under a local blob store root holding the header sidecars.
    pub fn meta_dir_name(&self) -> &str {
        &self.meta_dir_name
    }
}

// ---- Worker threads ----

/// Thread limits for the scan and dispatch pools.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Minimum worker count.
    pub floor: usize,
    /// Upper bound for the default; explicit settings may exceed it.
    pub default_max: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
            default_max: Self::DEFAULT_MAX_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 1;
    pub const DEFAULT_MAX_THREADS: usize = 16;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }

    /// Worker count when none is configured: available threads, clamped, then capped by the FD limit.
    pub fn default_workers(&self) -> usize {
        let n = self.all_threads.clamp(self.floor, self.default_max);
        self.cap(n)
    }

    /// Cap a requested worker count so the pools stay under the process FD limit.
    pub fn cap(&self, requested: usize) -> usize {
        let requested = requested.max(self.floor);
        match max_workers_by_fd_limit() {
            Some(fd_cap) if fd_cap < requested => {
                log::debug!("Capping workers {} -> {} (FD limit ~80%)", requested, fd_cap);
                fd_cap.max(self.floor)
            }
            _ => requested,
        }
    }
}

// ---- Hashing ----

/// Hashing I/O thresholds and buffer sizes.
pub struct HashingConsts;

impl HashingConsts {
    /// File size above which hashing uses memory-mapped I/O (bytes). 100 MB.
    pub const HASH_MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;
    /// Chunk size for reading files below mmap threshold (bytes). 1 MB.
    pub const HASH_READ_CHUNK_SIZE: usize = 1024 * 1024;
}

// ---- Channels ----

/// Task queue and path channel sizing.
pub struct QueueConsts;

impl QueueConsts {
    /// Task queue capacity when the config names none.
    pub const DEFAULT_CAPACITY: usize = 10_000;
    /// Walk → scan worker path channel capacity.
    pub const PATH_CHANNEL_CAP: usize = 50_000;
}

// ---- Content types ----

/// Content type used when the path gives no hint.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
