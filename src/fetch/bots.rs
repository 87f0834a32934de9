use super::{gate_article_html, get_page, stealth};
use crate::core::types::{StrategyId, StrategyResult};
use tracing::debug;
use url::Url;

/// Crawler impersonations. Paywalled sites whitelist indexer traffic so their
/// articles stay searchable; presenting a crawler identity (and, where the
/// site checks, a crawler source IP) walks straight through the wall.

pub async fn fetch_googlebot(client: &reqwest::Client, url: &Url) -> StrategyResult {
    let headers = vec![(
        "X-Forwarded-For",
        stealth::random_googlebot_ip().to_string(),
    )];
    run_bot(
        client,
        url,
        StrategyId::Googlebot,
        stealth::random_googlebot_user_agent(),
        headers,
    )
    .await
}

pub async fn fetch_bingbot(client: &reqwest::Client, url: &Url) -> StrategyResult {
    let headers = vec![
        ("X-Forwarded-For", stealth::random_bingbot_ip().to_string()),
        ("Referer", "https://www.bing.com/".to_string()),
    ];
    run_bot(
        client,
        url,
        StrategyId::Bingbot,
        stealth::random_bingbot_user_agent(),
        headers,
    )
    .await
}

/// Facebook's external-hit crawler. No IP spoof: Facebook publishes no stable
/// crawl ranges worth imitating, and most sites only check the UA + referer.
pub async fn fetch_facebookbot(client: &reqwest::Client, url: &Url) -> StrategyResult {
    let headers = vec![("Referer", "https://www.facebook.com/".to_string())];
    run_bot(
        client,
        url,
        StrategyId::Facebookbot,
        stealth::random_facebookbot_user_agent(),
        headers,
    )
    .await
}

async fn run_bot(
    client: &reqwest::Client,
    url: &Url,
    strategy: StrategyId,
    user_agent: &str,
    headers: Vec<(&str, String)>,
) -> StrategyResult {
    debug!("{} fetch of {}", strategy, url);
    match get_page(client, url.clone(), user_agent, &headers).await {
        Ok(page) => gate_article_html(strategy, page),
        Err(error) => StrategyResult::failure(strategy, error),
    }
}
