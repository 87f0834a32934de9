use super::googlenews;
use crate::core::config;
use crate::core::error::ConvertError;
use crate::core::types::{
    FetchOptions, OrchestratorOutcome, StrategyAttempt, StrategyBody, StrategyId, StrategyOutcome,
    StrategyResult,
};
use crate::core::AppState;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Cheap HTTP-level impersonations, raced first.
const PRIMARY_TIER: &[StrategyId] = &[
    StrategyId::Direct,
    StrategyId::Googlebot,
    StrategyId::Facebookbot,
    StrategyId::Bingbot,
];

/// Slower third-party-backed strategies, raced only after the primary tier
/// exhausts.
const FALLBACK_TIER: &[StrategyId] = &[
    StrategyId::Twelveft,
    StrategyId::Archive,
    StrategyId::Jina,
    StrategyId::Exa,
];

/// Below this an HTML response from a live site is a bootstrap shell, not an
/// article. Archival/proxy sources legitimately serve leaner bodies, hence
/// the lower fallback floor.
const PRIMARY_HTML_FLOOR: usize = 10_000;
const FALLBACK_HTML_FLOOR: usize = 1_000;
const MARKDOWN_FLOOR: usize = 100;

/// Snapshot size above which the Google-News route trusts the archive copy
/// without trying to decode the article id.
const NEWS_SNAPSHOT_FLOOR: usize = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RaceTier {
    Primary,
    Fallback,
}

/// Run the tiered strategy pipeline for one URL.
///
/// Branch order: explicit strategy → Google-News routing → no-bypass direct →
/// primary race → fallback race → aggregated failure. Within a race the first
/// result that passes the tier gate wins and the remaining in-flight
/// strategies are cancelled.
pub async fn orchestrate(
    state: &Arc<AppState>,
    url: &Url,
    opts: &FetchOptions,
) -> Result<OrchestratorOutcome, ConvertError> {
    let started = Instant::now();
    let mut attempts: Vec<StrategyAttempt> = Vec::new();

    if let Some(strategy) = opts.strategy {
        info!("explicit strategy {} for {}", strategy, url);
        let result = run_one(state, strategy, url).await;
        return finish_single(url, result, attempts, started);
    }

    let mut skip_primary = false;
    let mut bypass = opts.bypass;

    if googlenews::is_google_news_url(url) {
        info!("google news routing for {}", url);

        // An archived copy of the interstitial-free article is the cheapest
        // way out; only a substantial snapshot is trusted.
        let archived = run_one(state, StrategyId::Archive, url).await;
        let big_snapshot = matches!(
            &archived.outcome,
            StrategyOutcome::Fetched {
                body: StrategyBody::Html(html),
                ..
            } if html.len() > NEWS_SNAPSHOT_FLOOR
        );
        if big_snapshot {
            attempts.push(StrategyAttempt::ok(archived.label()));
            return Ok(outcome_of(archived, attempts, started));
        }
        let reason = match &archived.outcome {
            StrategyOutcome::Fetched { body, .. } => {
                format!("snapshot too small ({} bytes)", body.len())
            }
            StrategyOutcome::Failed { error } => error.clone(),
        };
        attempts.push(StrategyAttempt::failed(archived.label(), reason));

        let decoded = run_one(state, StrategyId::Googlenews, url).await;
        if decoded.is_success() {
            attempts.push(StrategyAttempt::ok(decoded.label()));
            return Ok(outcome_of(decoded, attempts, started));
        }
        attempts.push(StrategyAttempt::failed(
            decoded.label(),
            decoded.error().unwrap_or("failed").to_string(),
        ));

        // The bot race cannot follow the client-side redirect; go straight to
        // the fallback tier.
        bypass = true;
        skip_primary = true;
    }

    if !bypass {
        let result = run_one(state, StrategyId::Direct, url).await;
        return finish_single(url, result, attempts, started);
    }

    if !skip_primary {
        if let Some(winner) = race(state, url, PRIMARY_TIER, RaceTier::Primary, &mut attempts).await
        {
            return Ok(outcome_of(winner, attempts, started));
        }
    }

    if let Some(winner) = race(state, url, FALLBACK_TIER, RaceTier::Fallback, &mut attempts).await {
        return Ok(outcome_of(winner, attempts, started));
    }

    warn!(
        "all strategies exhausted for {} after {} attempts",
        url,
        attempts.len()
    );
    Err(ConvertError::AllStrategiesFailed {
        url: url.to_string(),
        attempts,
    })
}

/// One adapter under the configured timeout, holding an outbound permit for
/// the duration of the request.
async fn run_one(state: &Arc<AppState>, strategy: StrategyId, url: &Url) -> StrategyResult {
    let attempt = async {
        let _permit = state
            .outbound_limit
            .acquire()
            .await
            .expect("semaphore closed");
        state.strategy_runner.run(state, strategy, url).await
    };

    match tokio::time::timeout(config::strategy_timeout(strategy), attempt).await {
        Ok(result) => result,
        Err(_) => StrategyResult::failure(strategy, "timeout"),
    }
}

/// Race a tier. First completion that passes the gate wins; dropping the
/// stream on return cancels every still-running adapter, closing its
/// connection mid-flight.
async fn race(
    state: &Arc<AppState>,
    url: &Url,
    tier: &[StrategyId],
    gate: RaceTier,
    attempts: &mut Vec<StrategyAttempt>,
) -> Option<StrategyResult> {
    debug!(
        "racing {:?} tier for {}: {:?}",
        gate,
        url,
        tier.iter().map(|s| s.as_str()).collect::<Vec<_>>()
    );

    let mut in_flight: FuturesUnordered<_> = tier
        .iter()
        .map(|strategy| run_one(state, *strategy, url))
        .collect();

    while let Some(result) = in_flight.next().await {
        match validate(&result, gate) {
            Ok(()) => {
                info!("{} wins the {:?} race for {}", result.label(), gate, url);
                attempts.push(StrategyAttempt::ok(result.label()));
                return Some(result);
            }
            Err(reason) => {
                debug!("{} rejected: {}", result.label(), reason);
                attempts.push(StrategyAttempt::failed(result.label(), reason));
            }
        }
    }
    None
}

/// Tier gate. Markdown needs substance; HTML needs enough bytes to rule out
/// an SPA shell and must pass every validator.
fn validate(result: &StrategyResult, tier: RaceTier) -> Result<(), String> {
    match &result.outcome {
        StrategyOutcome::Failed { error } => Err(error.clone()),
        StrategyOutcome::Fetched {
            body: StrategyBody::Markdown(markdown),
            ..
        } => {
            if markdown.len() > MARKDOWN_FLOOR {
                Ok(())
            } else {
                Err(format!("markdown too short ({} bytes)", markdown.len()))
            }
        }
        StrategyOutcome::Fetched {
            body: StrategyBody::Html(html),
            ..
        } => {
            let passes_floor = match tier {
                RaceTier::Primary => html.len() >= PRIMARY_HTML_FLOOR,
                RaceTier::Fallback => html.len() > FALLBACK_HTML_FLOOR,
            };
            if !passes_floor {
                return Err(format!("response too small ({} bytes, SPA shell?)", html.len()));
            }
            if super::validators::is_blocked(html) {
                return Err("blocked page detected".to_string());
            }
            if super::validators::is_paywalled(html) {
                return Err("paywall detected".to_string());
            }
            if super::validators::is_google_error_page(html) {
                return Err("google error page detected".to_string());
            }
            Ok(())
        }
    }
}

/// Terminal path for the single-strategy branches (explicit strategy and
/// no-bypass): the adapter's own gates are authoritative, no tier floor.
fn finish_single(
    url: &Url,
    result: StrategyResult,
    mut attempts: Vec<StrategyAttempt>,
    started: Instant,
) -> Result<OrchestratorOutcome, ConvertError> {
    if result.is_success() {
        attempts.push(StrategyAttempt::ok(result.label()));
        return Ok(outcome_of(result, attempts, started));
    }
    let error = result.error().unwrap_or("failed").to_string();
    attempts.push(StrategyAttempt::failed(result.label(), error));
    Err(ConvertError::AllStrategiesFailed {
        url: url.to_string(),
        attempts,
    })
}

fn outcome_of(
    result: StrategyResult,
    attempts: Vec<StrategyAttempt>,
    started: Instant,
) -> OrchestratorOutcome {
    let strategy = result.label();
    match result.outcome {
        StrategyOutcome::Fetched { body, title } => OrchestratorOutcome {
            strategy,
            elapsed_ms: started.elapsed().as_millis() as u64,
            attempts,
            body,
            title,
        },
        // Callers only reach here after checking success.
        StrategyOutcome::Failed { .. } => {
            debug_assert!(false, "outcome_of called with a failed result");
            OrchestratorOutcome {
                strategy,
                elapsed_ms: started.elapsed().as_millis() as u64,
                attempts,
                body: StrategyBody::Html(String::new()),
                title: None,
            }
        }
    }
}
