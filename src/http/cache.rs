//! Disk-backed HTTP response cache.
//!
//! Each entry is two files named after the SHA-256 of its URL: `<key>.json`
//! holds the status, headers, and store time, `<key>.body` holds the raw body.
//! An in-memory index tracks entry sizes and recency so the directory stays
//! under its byte budget, evicting least-recently-used entries first.
//!
//! A directory can be opened by at most one [`DiskCache`] per process at a
//! time; a second open fails until the first is dropped.
//!
//! As a [`Middleware`] the cache answers fresh hits itself, stores cacheable
//! `200` responses from further down the chain, and falls back to a stale
//! entry when the network fails.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use super::cache_control::{CacheControl, Freshness};
use super::{HttpResponse, ResponseSource};
use crate::error::{Error, Result};

/// Directories currently owned by a live [`DiskCache`].
static OPEN_DIRS: Lazy<Mutex<HashSet<PathBuf>>> = Lazy::new(|| Mutex::new(HashSet::new()));

const META_EXT: &str = "json";
const BODY_EXT: &str = "body";
const STAGING_EXT: &str = "tmp";

/// On-disk metadata for one cached response.
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

#[derive(Debug)]
struct IndexEntry {
    size: u64,
    last_used: u64,
}

#[derive(Debug, Default)]
struct Index {
    entries: HashMap<String, IndexEntry>,
    size: u64,
    clock: u64,
}

impl Index {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn touch(&mut self, key: &str) -> bool {
        let now = self.tick();
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = now;
                true
            }
            None => false,
        }
    }

    fn insert(&mut self, key: String, size: u64) {
        let now = self.tick();
        if let Some(old) = self.entries.insert(key, IndexEntry { size, last_used: now }) {
            self.size -= old.size;
        }
        self.size += size;
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(old) => {
                self.size -= old.size;
                true
            }
            None => false,
        }
    }

    /// Drop least-recently-used entries until the total fits in `max_size`.
    fn evict_to(&mut self, max_size: u64) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.size > max_size {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    self.remove(&key);
                    evicted.push(key);
                }
                None => break,
            }
        }
        evicted
    }
}

/// A cached response together with the time it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub response: HttpResponse,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Time since the entry was stored.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.stored_at).to_std().unwrap_or_default()
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub size: u64,
    pub max_size: u64,
}

#[derive(Debug)]
pub struct DiskCache {
    dir: PathBuf,
    max_size: u64,
    index: Mutex<Index>,
}

impl DiskCache {
    /// Open or create the cache rooted at `dir`, indexing any entries a
    /// previous run left behind.
    pub fn open(dir: impl AsRef<Path>, max_size: u64) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Cache(format!("cannot create {}: {e}", dir.display())))?;
        let dir = dir
            .canonicalize()
            .map_err(|e| Error::Cache(format!("cannot resolve {}: {e}", dir.display())))?;

        {
            let mut open = OPEN_DIRS
                .lock()
                .map_err(|_| Error::Cache("cache registry poisoned".into()))?;
            if !open.insert(dir.clone()) {
                return Err(Error::Cache(format!(
                    "{} is already open in this process",
                    dir.display()
                )));
            }
        }

        // From here on Drop releases the registry slot, including on error.
        let cache = Self {
            dir,
            max_size,
            index: Mutex::new(Index::default()),
        };
        cache.load_index()?;
        tracing::debug!(
            "opened response cache at {} ({} entries)",
            cache.dir.display(),
            cache.stats().entries
        );
        Ok(cache)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn stats(&self) -> CacheStats {
        let index = self.lock_index();
        CacheStats {
            entries: index.entries.len(),
            size: index.size,
            max_size: self.max_size,
        }
    }

    /// Look up the entry for `url`, marking it most recently used.
    ///
    /// Unreadable entries are dropped and reported as misses.
    pub async fn get(&self, url: &Url) -> Option<CacheEntry> {
        let key = cache_key(url);
        if !self.lock_index().touch(&key) {
            return None;
        }

        match self.read_entry(&key).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("discarding unreadable cache entry for {url}: {e}");
                self.remove_key(&key).await;
                None
            }
        }
    }

    /// Store `response` as the entry for its URL.
    pub async fn put(&self, response: &HttpResponse) -> Result<()> {
        self.put_at(response, Utc::now()).await
    }

    /// Store `response` as if it had been received at `stored_at`.
    pub(crate) async fn put_at(&self, response: &HttpResponse, stored_at: DateTime<Utc>) -> Result<()> {
        let key = cache_key(&response.url);
        let meta = EntryMeta {
            url: response.url.to_string(),
            status: response.status,
            headers: response
                .headers
                .iter()
                .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
                .collect(),
            stored_at,
        };
        let meta = serde_json::to_vec(&meta)?;
        let size = (meta.len() + response.body.len()) as u64;

        if size > self.max_size {
            tracing::debug!("response for {} ({size} bytes) exceeds cache size", response.url);
            return Ok(());
        }

        // The old entry stays unreachable until both new files are in place.
        self.lock_index().remove(&key);
        if let Err(e) = self.write_files(&key, &meta, &response.body).await {
            for ext in [META_EXT, BODY_EXT] {
                report_delete(&key, ext, tokio::fs::remove_file(self.staging_path(&key, ext)).await);
            }
            self.delete_files(&key).await;
            return Err(e);
        }

        let evicted = {
            let mut index = self.lock_index();
            index.insert(key, size);
            index.evict_to(self.max_size)
        };
        for key in evicted {
            tracing::debug!("evicting cache entry {key}");
            self.delete_files(&key).await;
        }
        Ok(())
    }

    /// Remove the entry for `url`, if any.
    pub async fn remove(&self, url: &Url) {
        self.remove_key(&cache_key(url)).await;
    }

    async fn remove_key(&self, key: &str) {
        self.lock_index().remove(key);
        self.delete_files(key).await;
    }

    /// Stage both files next to their final names, then rename them in.
    async fn write_files(&self, key: &str, meta: &[u8], body: &[u8]) -> Result<()> {
        let files = [(BODY_EXT, body), (META_EXT, meta)];
        for (ext, bytes) in files {
            tokio::fs::write(self.staging_path(key, ext), bytes).await?;
        }
        for (ext, _) in files {
            tokio::fs::rename(self.staging_path(key, ext), self.path(key, ext)).await?;
        }
        Ok(())
    }

    async fn delete_files(&self, key: &str) {
        for ext in [META_EXT, BODY_EXT] {
            report_delete(key, ext, tokio::fs::remove_file(self.path(key, ext)).await);
        }
    }

    async fn read_entry(&self, key: &str) -> Result<CacheEntry> {
        let meta = tokio::fs::read(self.path(key, META_EXT)).await?;
        let meta: EntryMeta = serde_json::from_slice(&meta)?;
        let body = tokio::fs::read(self.path(key, BODY_EXT)).await?;

        let mut headers = HeaderMap::new();
        for (name, value) in &meta.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Cache(format!("bad header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Cache(format!("bad header value: {e}")))?;
            headers.append(name, value);
        }

        Ok(CacheEntry {
            response: HttpResponse {
                url: Url::parse(&meta.url)?,
                status: meta.status,
                headers,
                body: Bytes::from(body),
                source: ResponseSource::Cache,
            },
            stored_at: meta.stored_at,
        })
    }

    /// Build the index from the files in the cache directory, oldest first so
    /// that recency follows modification time.
    fn load_index(&self) -> Result<()> {
        let unreadable = |e: std::io::Error| {
            Error::Cache(format!("cannot list {}: {e}", self.dir.display()))
        };
        let mut found = Vec::new();
        for dirent in std::fs::read_dir(&self.dir).map_err(unreadable)? {
            let path = dirent.map_err(unreadable)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXT) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let body = self.path(key, BODY_EXT);
            let (Ok(meta_md), Ok(body_md)) = (std::fs::metadata(&path), std::fs::metadata(&body))
            else {
                tracing::debug!("skipping incomplete cache entry {key}");
                continue;
            };
            let modified = meta_md.modified().ok();
            found.push((modified, key.to_string(), meta_md.len() + body_md.len()));
        }
        found.sort();

        let evicted = {
            let mut index = self.lock_index();
            for (_, key, size) in found {
                index.insert(key, size);
            }
            index.evict_to(self.max_size)
        };
        for key in evicted {
            tracing::debug!("evicting cache entry {key}");
            for ext in [META_EXT, BODY_EXT] {
                report_delete(&key, ext, std::fs::remove_file(self.path(&key, ext)));
            }
        }
        Ok(())
    }

    fn path(&self, key: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ext}"))
    }

    fn staging_path(&self, key: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ext}.{STAGING_EXT}"))
    }

    fn lock_index(&self) -> std::sync::MutexGuard<'_, Index> {
        self.index.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for DiskCache {
    fn drop(&mut self) {
        if let Ok(mut open) = OPEN_DIRS.lock() {
            open.remove(&self.dir);
        }
    }
}

#[async_trait]
impl Middleware for DiskCache {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut ::http::Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        if req.method() != Method::GET {
            return next.run(req, extensions).await;
        }
        let url = req.url().clone();

        let mut fallback = None;
        if let Some(entry) = self.get(&url).await {
            let control = CacheControl::from_headers(&entry.response.headers);
            match control.freshness(entry.age()) {
                Freshness::Fresh => {
                    tracing::debug!("Response from cache: {}", url.path());
                    return entry
                        .response
                        .into_reqwest()
                        .map_err(reqwest_middleware::Error::middleware);
                }
                Freshness::Stale => fallback = Some(entry),
                Freshness::Expired => {}
            }
        }

        let response = match next.run(req, extensions).await {
            Ok(response) => response,
            Err(e) => {
                let Some(entry) = fallback else {
                    return Err(e);
                };
                tracing::debug!("network failed ({e}), serving stale cache: {}", url.path());
                return entry
                    .response
                    .into_reqwest()
                    .map_err(reqwest_middleware::Error::middleware);
            }
        };
        tracing::debug!("Response from server: {}", url.path());

        let storable = response.status() == StatusCode::OK
            && CacheControl::from_headers(response.headers()).is_storable();
        if !storable {
            return Ok(response);
        }

        let response = HttpResponse::read(url, response).await?;
        if let Err(e) = self.put(&response).await {
            tracing::warn!("failed to cache response for {}: {e}", response.url.path());
        }
        response
            .into_reqwest()
            .map_err(reqwest_middleware::Error::middleware)
    }
}

fn report_delete(key: &str, ext: &str, result: std::io::Result<()>) {
    if let Err(e) = result {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("failed to delete cache file {key}.{ext}: {e}");
        }
    }
}

/// Hex SHA-256 of the full URL, query included.
fn cache_key(url: &Url) -> String {
    hex::encode(Sha256::digest(url.as_str().as_bytes()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
