//! Time-boxed reuse of fetched stylesheets.
//!
//! [`CachedSource`] wraps any [`StylesheetSource`]. Entries live in memory
//! and, when a directory is configured, in `{dir}/{key}.css` so repeated CLI
//! runs skip the network as well. File modification time is the TTL clock
//! for on-disk entries.

use std::{
    collections::HashMap,
    fs::{self, create_dir_all},
    path::{Path, PathBuf},
    time::{Duration, Instant, SystemTime},
};

use parking_lot::Mutex;

use crate::{
    Result,
    config::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL},
    source::{StylesheetRequest, StylesheetSource},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long an entry is served before it is fetched again.
    pub ttl: Duration,
    /// Maximum in-memory entries; the oldest is evicted first.
    pub capacity: usize,
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_CACHE_TTL, capacity: DEFAULT_CACHE_CAPACITY, dir: None }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    css: String,
    fetched_at: Instant,
}

/// In-memory map of stylesheet text keyed by [`StylesheetRequest::cache_key`].
#[derive(Debug)]
pub struct StylesheetCache {
    config: CacheConfig,
    entries: Mutex<HashMap<String, Entry>>,
}

impl StylesheetCache {
    pub fn new(config: CacheConfig) -> Self {
        Self { config, entries: Mutex::new(HashMap::new()) }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(css) = self.get_memory(key) {
            log::debug!("Stylesheet cache hit (memory): {key}");
            return Some(css);
        }
        let css = self.get_disk(key)?;
        log::debug!("Stylesheet cache hit (disk): {key}");
        self.insert_memory(key, &css);
        Some(css)
    }

    pub fn insert(&self, key: &str, css: &str) {
        self.insert_memory(key, css);
        if let Some(path) = self.disk_path(key) {
            if let Err(err) = write_disk(&path, css) {
                log::warn!("Failed to write stylesheet cache '{}': {err}", path.display());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_memory(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() < self.config.ttl {
            return Some(entry.css.clone());
        }
        entries.remove(key);
        None
    }

    fn insert_memory(&self, key: &str, css: &str) {
        if self.config.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock();
        let ttl = self.config.ttl;
        entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);

        while entries.len() >= self.config.capacity && !entries.contains_key(key) {
            let oldest = entries.iter().min_by_key(|(_, entry)| entry.fetched_at).map(|(key, _)| key.clone());
            let Some(oldest) = oldest else { break };
            log::debug!("Evicting cached stylesheet {oldest}");
            entries.remove(&oldest);
        }
        entries.insert(key.to_string(), Entry { css: css.to_string(), fetched_at: Instant::now() });
    }

    fn disk_path(&self, key: &str) -> Option<PathBuf> {
        self.config.dir.as_ref().map(|dir| dir.join(format!("{key}.css")))
    }

    fn get_disk(&self, key: &str) -> Option<String> {
        let path = self.disk_path(key)?;
        let modified = fs::metadata(&path).and_then(|meta| meta.modified()).ok()?;
        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        if age >= self.config.ttl {
            log::debug!("Stylesheet cache file expired: {}", path.display());
            return None;
        }
        fs::read_to_string(&path).ok()
    }
}

fn write_disk(path: &Path, css: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    fs::write(path, css)
}

/// A [`StylesheetSource`] that serves repeated requests from a cache.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    cache: StylesheetCache,
}

impl<S: StylesheetSource> CachedSource<S> {
    pub fn new(inner: S, config: CacheConfig) -> Self {
        Self { inner, cache: StylesheetCache::new(config) }
    }

    pub fn cache(&self) -> &StylesheetCache {
        &self.cache
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: StylesheetSource> StylesheetSource for CachedSource<S> {
    fn fetch(&self, request: &StylesheetRequest) -> Result<String> {
        let key = request.cache_key();
        if let Some(css) = self.cache.get(&key) {
            log::info!("Using cached stylesheet for {key}");
            return Ok(css);
        }
        let css = self.inner.fetch(request)?;
        self.cache.insert(&key, &css);
        Ok(css)
    }
}
