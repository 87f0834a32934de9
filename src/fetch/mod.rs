pub mod archive;
pub mod bots;
pub mod charset;
pub mod direct;
pub mod exa;
pub mod googlenews;
pub mod jina;
pub mod orchestrator;
pub mod stealth;
pub mod twelveft;
pub mod validators;

use crate::core::types::{StrategyId, StrategyResult};
use crate::core::AppState;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Dispatch seam between the orchestrator and the adapters. The live
/// implementation matches on the strategy id; tests swap in mocks through
/// `AppState::with_strategy_runner`.
#[async_trait]
pub trait StrategyRunner: Send + Sync {
    async fn run(&self, state: &Arc<AppState>, strategy: StrategyId, url: &Url) -> StrategyResult;
}

pub struct LiveStrategyRunner;

#[async_trait]
impl StrategyRunner for LiveStrategyRunner {
    async fn run(&self, state: &Arc<AppState>, strategy: StrategyId, url: &Url) -> StrategyResult {
        match strategy {
            StrategyId::Direct => direct::fetch(&state.http_client, url).await,
            StrategyId::Googlebot => bots::fetch_googlebot(&state.http_client, url).await,
            StrategyId::Facebookbot => bots::fetch_facebookbot(&state.http_client, url).await,
            StrategyId::Bingbot => bots::fetch_bingbot(&state.http_client, url).await,
            StrategyId::Archive => archive::fetch(&state.http_client, url).await,
            StrategyId::Twelveft => twelveft::fetch(&state.http_client, url).await,
            StrategyId::Jina => jina::fetch(&state.http_client, url).await,
            StrategyId::Exa => exa::fetch(state, url).await,
            StrategyId::Googlenews => googlenews::fetch(state, url).await,
        }
    }
}

/// Decoded HTTP response shared by the HTML-producing adapters.
pub(crate) struct PageResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// One GET with the given identity, body decoded through the charset sniffer.
/// Transport failures come back as error strings; adapters never raise.
pub(crate) async fn get_page(
    client: &reqwest::Client,
    url: Url,
    user_agent: &str,
    headers: &[(&str, String)],
) -> Result<PageResponse, String> {
    let mut req = client.get(url).header("User-Agent", user_agent);
    for (name, value) in headers {
        req = req.header(*name, value.as_str());
    }

    let response = req
        .send()
        .await
        .map_err(|e| format!("request failed: {}", e))?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("failed to read response body: {}", e))?;
    let body = charset::decode_html(&bytes, content_type.as_deref());

    Ok(PageResponse {
        status,
        content_type,
        body,
    })
}

/// Shared acceptance gate for the impersonation adapters: 2xx, HTML
/// content type, and no block/paywall markers in the body head.
pub(crate) fn gate_article_html(strategy: StrategyId, page: PageResponse) -> StrategyResult {
    if !(200..300).contains(&page.status) {
        return StrategyResult::failure(strategy, format!("HTTP status {}", page.status));
    }
    match page.content_type.as_deref() {
        Some(ct) if ct.contains("text/html") => {}
        Some(ct) => {
            return StrategyResult::failure(
                strategy,
                format!("content-type '{}' is not HTML", ct),
            );
        }
        None => return StrategyResult::failure(strategy, "response has no content-type"),
    }
    if validators::is_blocked(&page.body) {
        return StrategyResult::failure(strategy, "blocked page detected");
    }
    if validators::is_paywalled(&page.body) {
        return StrategyResult::failure(strategy, "paywall detected");
    }
    StrategyResult::html(strategy, page.body, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_rejects_non_html() {
        let page = PageResponse {
            status: 200,
            content_type: Some("application/pdf".to_string()),
            body: "%PDF-1.7".to_string(),
        };
        let res = gate_article_html(StrategyId::Direct, page);
        assert_eq!(res.error(), Some("content-type 'application/pdf' is not HTML"));
    }

    #[test]
    fn test_gate_rejects_bad_status() {
        let page = PageResponse {
            status: 403,
            content_type: Some("text/html".to_string()),
            body: "<html>no</html>".to_string(),
        };
        let res = gate_article_html(StrategyId::Googlebot, page);
        assert_eq!(res.error(), Some("HTTP status 403"));
    }

    #[test]
    fn test_gate_rejects_blocked_body() {
        let page = PageResponse {
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: "<html><body>Checking your browser before accessing</body></html>".to_string(),
        };
        let res = gate_article_html(StrategyId::Direct, page);
        assert_eq!(res.error(), Some("blocked page detected"));
    }

    #[test]
    fn test_gate_accepts_clean_article() {
        let page = PageResponse {
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: "<html><body><article>A perfectly ordinary article body.</article></body></html>"
                .to_string(),
        };
        let res = gate_article_html(StrategyId::Direct, page);
        assert!(res.is_success());
    }
}
