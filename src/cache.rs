use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::core::config;
use tracing::debug;

/// One converted page. `content` is the final Markdown (or JSON envelope),
/// `content_type` the header the front-end should serve it with.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub content: String,
    pub strategy: String,
    pub content_type: String,
    pub title: Option<String>,
    inserted_at: Instant,
}

/// Process-wide URL → conversion cache. Insertion order is preserved and the
/// oldest entry is dropped first once the cap is reached; expiry is checked on
/// every read so a stale hit is impossible.
pub struct UrlCache {
    inner: Mutex<VecDeque<(String, CacheEntry)>>,
    ttl: Duration,
}

impl UrlCache {
    pub fn new() -> Self {
        Self::with_ttl(config::CACHE_TTL)
    }

    /// Tests shrink the TTL instead of waiting out the real ten minutes.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            ttl,
        }
    }

    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        let mut entries = self.inner.lock().expect("url cache mutex poisoned");
        let pos = entries.iter().position(|(key, _)| key == url)?;
        if entries[pos].1.inserted_at.elapsed() > self.ttl {
            entries.remove(pos);
            debug!("cache entry expired for {}", url);
            return None;
        }
        Some(entries[pos].1.clone())
    }

    pub fn insert(
        &self,
        url: &str,
        content: String,
        strategy: String,
        content_type: String,
        title: Option<String>,
    ) {
        let mut entries = self.inner.lock().expect("url cache mutex poisoned");
        if let Some(pos) = entries.iter().position(|(key, _)| key == url) {
            entries.remove(pos);
        }
        entries.push_back((
            url.to_string(),
            CacheEntry {
                content,
                strategy,
                content_type,
                title,
                inserted_at: Instant::now(),
            },
        ));
        while entries.len() > config::CACHE_MAX_ENTRIES {
            if let Some((evicted, _)) = entries.pop_front() {
                debug!("cache full, evicting oldest entry {}", evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("url cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for UrlCache {
    fn default() -> Self {
        Self::new()
    }
}
