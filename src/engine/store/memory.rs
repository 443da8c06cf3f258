//! In-memory blob store that records every call.

use anyhow::{Context, Result, anyhow, bail};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{BlobMeta, BlobStore};

/// Successful call counts, by operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub put: usize,
    pub delete: usize,
    pub replace_metadata: usize,
}

impl StoreCalls {
    pub fn mutations(&self) -> usize {
        self.put + self.delete + self.replace_metadata
    }
}

#[derive(Default)]
struct Inner {
    blobs: HashMap<String, (Vec<u8>, BlobMeta)>,
    calls: StoreCalls,
    failing: HashSet<String>,
}

/// Blobs kept in a `HashMap` behind a mutex. Counts calls and can be told to fail for given keys,
/// which makes it the store of choice for tests and for trial runs that must not touch real storage.
#[derive(Default)]
pub struct MemoryBlobStore {
    inner: Mutex<Inner>,
}

impl MemoryBlobStore {
    /// Store pre-populated with blobs (as if uploaded by an earlier pass).
    pub fn with_blobs(blobs: impl IntoIterator<Item = (String, Vec<u8>, BlobMeta)>) -> Self {
        let store = MemoryBlobStore::default();
        if let Ok(mut inner) = store.inner.lock() {
            for (key, data, meta) in blobs {
                inner.blobs.insert(key, (data, meta));
            }
        }
        store
    }

    fn inner(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    /// Make every call on `key` fail until [`Self::heal`] is called.
    pub fn fail_on(&self, key: &str) {
        if let Ok(mut inner) = self.inner() {
            inner.failing.insert(key.to_string());
        }
    }

    pub fn heal(&self, key: &str) {
        if let Ok(mut inner) = self.inner() {
            inner.failing.remove(key);
        }
    }

    pub fn calls(&self) -> StoreCalls {
        self.inner().map(|i| i.calls.clone()).unwrap_or_default()
    }

    pub fn reset_calls(&self) {
        if let Ok(mut inner) = self.inner() {
            inner.calls = StoreCalls::default();
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner()
            .map(|i| i.blobs.contains_key(key))
            .unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<(Vec<u8>, BlobMeta)> {
        self.inner().ok()?.blobs.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner().map(|i| i.blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_failing(inner: &Inner, op: &str, key: &str) -> Result<()> {
    if inner.failing.contains(key) {
        bail!("{op} {key}: injected failure");
    }
    Ok(())
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, source: &Path, meta: &BlobMeta) -> Result<()> {
        let data = std::fs::read(source).with_context(|| format!("read {}", source.display()))?;
        let mut inner = self.inner()?;
        check_failing(&inner, "put", key)?;
        inner.blobs.insert(key.to_string(), (data, meta.clone()));
        inner.calls.put += 1;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut inner = self.inner()?;
        check_failing(&inner, "delete", key)?;
        inner.blobs.remove(key);
        inner.calls.delete += 1;
        Ok(())
    }

    fn replace_metadata(&self, key: &str, meta: &BlobMeta) -> Result<()> {
        let mut inner = self.inner()?;
        check_failing(&inner, "replace_metadata", key)?;
        let Some((_, stored)) = inner.blobs.get_mut(key) else {
            bail!("cannot replace headers of missing blob {key}");
        };
        *stored = meta.clone();
        inner.calls.replace_metadata += 1;
        Ok(())
    }
}
