//! Load the bloblog TOML config file. Everything here is read-only for the pipeline once resolved.
//!
//! ```toml
//! workers = 8
//! queue_capacity = 10000
//!
//! [sync]
//! root_path = "public"
//! exclude_patterns = ["\\.git/", "\\.DS_Store$"]
//!
//! [deployment.metadb]
//! type = "sqlite"
//! path = ".bloblog.db"
//!
//! [deployment.storage]
//! type = "local"
//! path = "/srv/bucket"
//!
//! [cache_control.default]
//! max-age = 3600
//! settings = "public,must-revalidate"
//!
//! [[cache_control.rules]]
//! mimetype = ["text/html"]
//! settings = "public"
//! age = [{ item = "1d", max = "1w" }, { item = "30d", max = "1y" }]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::SyncOpts;
use crate::rules::CacheControlRules;
use crate::utils::config::{PackagePaths, QueueConsts, WorkerThreadLimits};

#[derive(Debug, Deserialize)]
pub struct BlobLogToml {
    pub workers: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub sync: SyncSection,
    #[serde(default)]
    pub deployment: DeploymentSection,
    pub cache_control: CacheControlSection,
}

#[derive(Debug, Deserialize)]
pub struct SyncSection {
    pub root_path: PathBuf,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub parallel_walk: bool,
    #[serde(default)]
    pub follow_links: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeploymentSection {
    #[serde(default)]
    pub metadb: CatalogConfig,
    pub storage: Option<StorageConfig>,
}

/// Which metadata catalog backend to open.
#[derive(Clone, Debug, Deserialize)]
pub struct CatalogConfig {
    #[serde(rename = "type", default = "default_catalog_type")]
    pub kind: String,
    /// Database file. Defaults to the package catalog filename next to the config file.
    pub path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            kind: default_catalog_type(),
            path: None,
        }
    }
}

fn default_catalog_type() -> String {
    "sqlite".to_string()
}

/// Which blob store backend to open.
#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CacheControlSection {
    pub default: DefaultCacheControl,
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DefaultCacheControl {
    #[serde(rename = "max-age")]
    pub max_age: u64,
    #[serde(default)]
    pub settings: String,
}

/// One `[[cache_control.rules]]` entry as written; ages are parsed by [`CacheControlRules`].
#[derive(Clone, Debug, Deserialize)]
pub struct RawRule {
    pub mimetype: Vec<String>,
    #[serde(default)]
    pub settings: String,
    #[serde(default)]
    pub age: Vec<RawBracket>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawBracket {
    pub item: String,
    pub max: String,
}

/// Everything a run needs, resolved from the file (paths made absolute against the file's directory).
#[derive(Debug)]
pub struct LoadedConfig {
    pub opts: SyncOpts,
    pub rules: CacheControlRules,
    pub catalog: CatalogConfig,
    pub storage: StorageConfig,
}

/// Parse TOML text. `base_dir` anchors relative paths.
pub fn parse_config(text: &str, base_dir: &Path) -> Result<LoadedConfig> {
    let file: BlobLogToml = toml::from_str(text).context("parse config")?;
    resolve(file, base_dir)
}

/// Load and resolve the config at `path`. Any error here is fatal: no work has started.
pub fn load_config(path: &Path) -> Result<LoadedConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    parse_config(&text, base_dir).with_context(|| format!("load config {}", path.display()))
}

fn anchor(base_dir: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn resolve(file: BlobLogToml, base_dir: &Path) -> Result<LoadedConfig> {
    let rules = CacheControlRules::from_config(&file.cache_control)?;

    let limits = WorkerThreadLimits::current();
    let workers = match file.workers {
        Some(0) => anyhow::bail!("workers must be at least 1"),
        Some(n) => limits.cap(n),
        None => limits.default_workers(),
    };
    let queue_capacity = match file.queue_capacity {
        Some(0) => anyhow::bail!("queue_capacity must be at least 1"),
        Some(n) => n,
        None => QueueConsts::DEFAULT_CAPACITY,
    };

    let mut catalog = file.deployment.metadb;
    catalog.path = Some(match catalog.path {
        Some(p) => anchor(base_dir, &p),
        None => base_dir.join(PackagePaths::get().catalog_filename()),
    });

    let mut storage = file
        .deployment
        .storage
        .context("missing [deployment.storage] section")?;
    storage.path = storage.path.map(|p| anchor(base_dir, &p));

    let mut opts = SyncOpts::new(anchor(base_dir, &file.sync.root_path));
    opts.exclude = file.sync.exclude_patterns;
    opts.workers = workers;
    opts.queue_capacity = queue_capacity;
    opts.parallel_walk = file.sync.parallel_walk;
    opts.follow_links = file.sync.follow_links;
    opts.catalog_path = catalog.path.clone();

    Ok(LoadedConfig {
        opts,
        rules,
        catalog,
        storage,
    })
}
