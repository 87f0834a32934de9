use crate::core::types::StrategyId;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Ambient tunables. Every value has a compiled-in default; env vars are
// operational overrides only and never change caller-visible semantics.
// ---------------------------------------------------------------------------

/// URL cache capacity. Oldest entry is dropped first once full.
pub const CACHE_MAX_ENTRIES: usize = 100;

/// URL cache entry lifetime, checked on every read.
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 10);

/// Per-strategy request budget when nothing is overridden.
pub const DEFAULT_STRATEGY_TIMEOUT_MS: u64 = 20_000;

/// Timeout applied around a single strategy run.
///
/// `CLEARPAGE_STRATEGY_TIMEOUT_MS` overrides the base; a per-strategy
/// `CLEARPAGE_STRATEGY_TIMEOUT_MS_<ID>` (e.g. `..._ARCHIVE`) wins over both.
pub fn strategy_timeout(strategy: StrategyId) -> Duration {
    let base_ms = std::env::var("CLEARPAGE_STRATEGY_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_STRATEGY_TIMEOUT_MS);

    let key = format!(
        "CLEARPAGE_STRATEGY_TIMEOUT_MS_{}",
        strategy.as_str().to_ascii_uppercase()
    );
    let ms = std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(base_ms);

    Duration::from_millis(ms.max(1_000))
}

/// Cap on concurrent outbound strategy requests, shared across races.
pub fn outbound_limit() -> usize {
    std::env::var("OUTBOUND_LIMIT")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(32)
}
