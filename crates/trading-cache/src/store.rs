//! Durable, template-keyed memoization.
//!
//! A [`DurableCache`] stores one entry per (resolved directory, filename).
//! The directory comes from a [`PathTemplate`] resolved against the owner's
//! attributes on every call; the filename defaults to
//! `<operation name>.<codec extension>`. Call arguments never take part in
//! the key: once an entry exists for an owner snapshot, every later call for
//! that snapshot returns it, whatever arguments are passed.
//!
//! # Concurrency
//!
//! Entries are written to a temp file and renamed into place, so a crash
//! never leaves a truncated entry. Threads sharing one `DurableCache` are
//! serialized per entry path, so a miss is computed once. Separate processes
//! (or separate `DurableCache` values) pointing at the same directory are not
//! coordinated: both may run the operation and the last rename wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::attributes::Attributes;
use crate::codec::{BincodeCodec, Codec, JsonCodec};
use crate::error::{CacheError, Result};
use crate::metrics::CacheMetrics;
use crate::paths;
use crate::template::PathTemplate;

/// Per-path locks for callers sharing one cache value.
///
/// An entry lives only while some caller holds or waits on it.
#[derive(Debug, Default)]
struct KeyLocks {
    inner: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    /// Run `f` while holding the lock for `path`.
    fn with_lock<R>(&self, path: &Path, f: impl FnOnce() -> R) -> R {
        let key_lock = self
            .inner
            .lock()
            .entry(path.to_path_buf())
            .or_default()
            .clone();
        let result = {
            let _guard = key_lock.lock();
            f()
        };
        self.release(path, key_lock);
        result
    }

    fn release(&self, path: &Path, key_lock: Arc<Mutex<()>>) {
        let mut inner = self.inner.lock();
        // One reference in the map plus ours: nobody else is waiting.
        if Arc::strong_count(&key_lock) == 2 {
            inner.remove(path);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

/// File-backed memoization keyed by a path template and an operation name.
#[derive(Debug)]
pub struct DurableCache<C: Codec = JsonCodec> {
    template: PathTemplate,
    filename: Option<String>,
    codec: C,
    metrics: CacheMetrics,
    locks: KeyLocks,
}

impl DurableCache<JsonCodec> {
    /// JSON-backed cache under `template`.
    pub fn json(template: &str) -> Result<Self> {
        Self::new(template, JsonCodec::new())
    }
}

impl DurableCache<BincodeCodec> {
    /// Binary-backed cache under `template`.
    pub fn bincode(template: &str) -> Result<Self> {
        Self::new(template, BincodeCodec)
    }
}

impl<C: Codec> DurableCache<C> {
    /// Build a cache. A malformed template is rejected here, not on first call.
    pub fn new(template: &str, codec: C) -> Result<Self> {
        Ok(Self {
            template: PathTemplate::parse(template)?,
            filename: None,
            codec,
            metrics: CacheMetrics::default(),
            locks: KeyLocks::default(),
        })
    }

    /// Cache stored at one fixed file, independent of any owner.
    pub fn at_path(path: impl AsRef<Path>, codec: C) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CacheError::MalformedTemplate {
                template: path.display().to_string(),
                position: 0,
                reason: "fixed cache path has no file name",
            })?;
        let dir = path
            .parent()
            .map(|p| p.to_string_lossy().replace('{', "{{").replace('}', "}}"))
            .unwrap_or_default();
        Ok(Self::new(&dir, codec)?.with_filename(file_name))
    }

    /// Use `filename` verbatim instead of `<operation>.<extension>`.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Report into an existing (possibly shared) set of counters.
    pub fn with_metrics(mut self, metrics: CacheMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Filename used for entries of operation `name`.
    pub fn filename_for(&self, name: &str) -> String {
        match &self.filename {
            Some(filename) => filename.clone(),
            None => format!("{}.{}", name, self.codec.extension()),
        }
    }

    /// Full entry path for `owner`'s current attributes. No I/O.
    pub fn entry_path<O: Attributes + ?Sized>(&self, name: &str, owner: &O) -> Result<PathBuf> {
        let dir = self.template.resolve(&owner.attributes())?;
        Ok(dir.join(self.filename_for(name)))
    }

    /// Return the stored result for `owner`, computing and storing it on a miss.
    ///
    /// On a hit `operation` is not called at all, so none of its side effects
    /// happen. A stored entry that fails to decode is reported as
    /// [`CacheError::Decode`] and left on disk.
    pub fn memoize<O, T, F>(&self, name: &str, owner: &O, operation: F) -> Result<T>
    where
        O: Attributes + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce(&O) -> anyhow::Result<T>,
    {
        let dir = self.template.resolve(&owner.attributes())?;
        paths::ensure_dir(&dir)?;
        let path = dir.join(self.filename_for(name));

        self.locks
            .with_lock(&path, || self.load_or_fill(name, owner, &path, operation))
    }

    fn load_or_fill<O, T, F>(&self, name: &str, owner: &O, path: &Path, operation: F) -> Result<T>
    where
        O: Attributes + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce(&O) -> anyhow::Result<T>,
    {
        if path.exists() {
            return self.load(name, path);
        }

        self.metrics.record_miss();
        debug!(operation = name, path = %path.display(), "durable cache miss");

        let value = operation(owner).map_err(CacheError::Operation)?;
        let bytes = self
            .codec
            .encode(&value)
            .map_err(|e| CacheError::Encode(e.to_string()))?;
        paths::atomic_write(path, &bytes)?;
        self.metrics.record_write();

        Ok(value)
    }

    fn load<T: DeserializeOwned>(&self, name: &str, path: &Path) -> Result<T> {
        let bytes = paths::read_file(path)?;
        match self.codec.decode(&bytes) {
            Ok(value) => {
                self.metrics.record_hit();
                debug!(operation = name, path = %path.display(), "durable cache hit");
                Ok(value)
            }
            Err(e) => {
                self.metrics.record_decode_failure();
                warn!(operation = name, path = %path.display(), error = %e, "undecodable cache entry");
                Err(CacheError::Decode {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Delete the entry for `owner` so the next call recomputes it.
    /// Returns whether an entry existed.
    pub fn evict<O: Attributes + ?Sized>(&self, name: &str, owner: &O) -> Result<bool> {
        let path = self.entry_path(name, owner)?;
        self.locks
            .with_lock(&path, || paths::remove_if_exists(&path))
    }

    /// Bind this cache to one operation, producing a reusable callable.
    pub fn wrap<F>(self, name: impl Into<String>, operation: F) -> CachedOperation<C, F> {
        CachedOperation {
            cache: self,
            name: name.into(),
            operation,
        }
    }
}

/// An operation bound to a [`DurableCache`]; see [`DurableCache::wrap`].
#[derive(Debug)]
pub struct CachedOperation<C: Codec, F> {
    cache: DurableCache<C>,
    name: String,
    operation: F,
}

impl<C: Codec, F> CachedOperation<C, F> {
    /// Run the operation for `owner` through the cache. `args` reach the
    /// operation on a miss but never affect the cache key.
    pub fn call<O, A, T>(&self, owner: &O, args: A) -> Result<T>
    where
        O: Attributes + ?Sized,
        T: Serialize + DeserializeOwned,
        F: Fn(&O, A) -> anyhow::Result<T>,
    {
        self.cache
            .memoize(&self.name, owner, |owner| (self.operation)(owner, args))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cache(&self) -> &DurableCache<C> {
        &self.cache
    }

    pub fn entry_path<O: Attributes + ?Sized>(&self, owner: &O) -> Result<PathBuf> {
        self.cache.entry_path(&self.name, owner)
    }
}
