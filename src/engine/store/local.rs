//! Directory-backed blob store.
//!
//! Objects are plain files under the store root, at the same relative path as their key.
//! Headers live in JSON sidecars under `<root>/.bloblog-meta/<key>.json`, so a web server
//! pointed at the root serves the content and the headers are still inspectable.

use anyhow::{Context, Result, bail};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::{BlobMeta, BlobStore};
use crate::utils::config::PackagePaths;

#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.exists() {
            if !root.is_dir() {
                bail!("blob store root is not a directory: {}", root.display());
            }
        } else {
            std::fs::create_dir_all(&root)
                .with_context(|| format!("create blob store root {}", root.display()))?;
        }
        Ok(LocalBlobStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of the object stored under `key`.
    pub fn object_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_key(key)?))
    }

    /// Filesystem path of the header sidecar for `key`.
    pub fn meta_path(&self, key: &str) -> Result<PathBuf> {
        let rel = validate_key(key)?;
        let mut name = rel.as_os_str().to_owned();
        name.push(".json");
        Ok(self
            .root
            .join(PackagePaths::get().meta_dir_name())
            .join(name))
    }

    /// Headers currently stored for `key`, if the object has any.
    pub fn read_meta(&self, key: &str) -> Result<Option<BlobMeta>> {
        let path = self.meta_path(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(
                serde_json::from_slice(&bytes)
                    .with_context(|| format!("parse {}", path.display()))?,
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    fn write_meta(&self, key: &str, meta: &BlobMeta) -> Result<()> {
        let path = self.meta_path(key)?;
        ensure_parent(&path)?;
        let json = serde_json::to_vec_pretty(meta).context("serialize blob headers")?;
        write_then_rename(&path, |tmp| {
            std::fs::write(tmp, &json).map_err(Into::into)
        })
    }
}

/// Keys are relative, `/`-separated, and may not climb out of the root.
fn validate_key(key: &str) -> Result<PathBuf> {
    let path = Path::new(key);
    if key.is_empty() || path.is_absolute() {
        bail!("invalid blob key {key:?}");
    }
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            _ => bail!("invalid blob key {key:?}"),
        }
    }
    Ok(path.to_path_buf())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Write through a sibling temp file so readers never see a half-written object.
fn write_then_rename(dest: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    let mut tmp_name = dest.file_name().unwrap_or_default().to_owned();
    tmp_name.push(".partial");
    let tmp = dest.with_file_name(tmp_name);
    if let Err(e) = write(&tmp) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    std::fs::rename(&tmp, dest)
        .with_context(|| format!("rename {} to {}", tmp.display(), dest.display()))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
    }
}

impl BlobStore for LocalBlobStore {
    fn put(&self, key: &str, source: &Path, meta: &BlobMeta) -> Result<()> {
        let dest = self.object_path(key)?;
        ensure_parent(&dest)?;
        write_then_rename(&dest, |tmp| {
            std::fs::copy(source, tmp)
                .with_context(|| format!("copy {} to {}", source.display(), tmp.display()))?;
            Ok(())
        })?;
        self.write_meta(key, meta)
    }

    fn delete(&self, key: &str) -> Result<()> {
        remove_if_exists(&self.object_path(key)?)?;
        remove_if_exists(&self.meta_path(key)?)
    }

    fn replace_metadata(&self, key: &str, meta: &BlobMeta) -> Result<()> {
        let object = self.object_path(key)?;
        if !object.is_file() {
            bail!("cannot replace headers of missing blob {key}");
        }
        self.write_meta(key, meta)
    }
}
