use std::sync::Arc;
use std::time::Duration;

use crate::cache::UrlCache;
use crate::core::config;
use crate::fetch::{LiveStrategyRunner, StrategyRunner};

/// Process-wide context threaded through every request. The URL cache and the
/// Exa session id are the only mutable members; strategy UA/IP tables are
/// `&'static` and shared without synchronization.
pub struct AppState {
    pub http_client: reqwest::Client,
    // Cache for repeated conversions of the same URL
    pub url_cache: UrlCache,
    // Exa MCP session id, written only by the exa adapter; cleared on error
    // so the next call re-initializes.
    pub exa_session: tokio::sync::Mutex<Option<String>>,
    // Concurrency control for external calls
    pub outbound_limit: Arc<tokio::sync::Semaphore>,
    // Strategy dispatch seam; tests swap in a mock runner.
    pub strategy_runner: Arc<dyn StrategyRunner>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cached_urls", &self.url_cache.len())
            .finish()
    }
}

impl AppState {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            url_cache: UrlCache::new(),
            exa_session: tokio::sync::Mutex::new(None),
            outbound_limit: Arc::new(tokio::sync::Semaphore::new(config::outbound_limit())),
            strategy_runner: Arc::new(LiveStrategyRunner),
        }
    }

    /// Client with the redirect/timeout posture every strategy shares.
    pub fn default_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Builder: replace the live strategy dispatch (tests).
    pub fn with_strategy_runner(mut self, runner: Arc<dyn StrategyRunner>) -> Self {
        self.strategy_runner = runner;
        self
    }

    /// Builder: replace the URL cache (tests shrink the TTL).
    pub fn with_url_cache(mut self, cache: UrlCache) -> Self {
        self.url_cache = cache;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Self::default_client())
    }
}
