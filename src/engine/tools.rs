//! Path and filter utilities

use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::utils::config::FALLBACK_CONTENT_TYPE;

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Catalog/blob key for a relative path: forward slashes on every platform.
pub fn path_to_db_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Compile exclusion patterns. A pattern that is not a valid regular expression is logged and skipped.
pub fn compile_excludes(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!("Ignoring exclude pattern {:?}: {}", p, e);
                None
            }
        })
        .collect()
}

/// True if any pattern matches anywhere in the full path.
pub fn is_excluded(path: &Path, excludes: &[Regex]) -> bool {
    if excludes.is_empty() {
        return false;
    }
    let path_str = path.to_string_lossy();
    excludes.iter().any(|re| re.is_match(&path_str))
}

/// Returns true if the walked file should be scanned.
pub fn should_include_in_walk(
    path: &Path,
    root: &Path,
    catalog_canonical: &Option<PathBuf>,
    excludes: &[Regex],
) -> bool {
    if path == root {
        return false;
    }
    if let Some(db) = catalog_canonical
        && is_catalog_file(path, db)
    {
        return false;
    }
    !is_excluded(path, excludes)
}

/// The catalog itself and its SQLite WAL/SHM companions.
fn is_catalog_file(path: &Path, db: &Path) -> bool {
    if path == db {
        return true;
    }
    let (Some(name), Some(db_name)) = (path.file_name(), db.file_name()) else {
        return false;
    };
    let (name, db_name) = (name.to_string_lossy(), db_name.to_string_lossy());
    path.parent() == db.parent()
        && (name == format!("{db_name}-wal") || name == format!("{db_name}-shm"))
}

/// MIME type guessed from the extension; `application/octet-stream` when unknown.
pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// Nanoseconds since epoch; pre-epoch times clamp to 0.
pub fn system_time_to_ns(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

pub fn now_ns() -> i64 {
    system_time_to_ns(SystemTime::now())
}

/// Modification time of `path` in nanoseconds since epoch.
pub fn mtime_ns(path: &Path) -> Result<i64> {
    let meta = std::fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    Ok(meta.modified().map(system_time_to_ns).unwrap_or(0))
}

pub fn check_root_and_canonicalize(path: &Path) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("canonicalize sync root {}", path.display()))?;
    if !canonical.is_dir() {
        anyhow::bail!("sync root is not a directory: {}", canonical.display());
    }
    Ok(canonical)
}

pub fn canonicalize_paths(
    root: &Path,
    catalog_path: Option<&Path>,
) -> Result<(PathBuf, Option<PathBuf>)> {
    let root = check_root_and_canonicalize(root)?;
    let catalog_canonical = catalog_path.and_then(|p| p.canonicalize().ok());
    Ok((root, catalog_canonical))
}
