use super::{gate_article_html, get_page, stealth};
use crate::core::types::{StrategyId, StrategyResult};
use tracing::debug;
use url::Url;

/// Plain fetch with a realistic desktop browser identity. The baseline every
/// race includes; also the only strategy run when bypass is off.
pub async fn fetch(client: &reqwest::Client, url: &Url) -> StrategyResult {
    let user_agent = stealth::random_desktop_user_agent();
    let headers = stealth::stealth_headers();
    let header_refs: Vec<(&str, String)> = headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.clone()))
        .collect();

    debug!("direct fetch of {}", url);
    match get_page(client, url.clone(), user_agent, &header_refs).await {
        Ok(page) => gate_article_html(StrategyId::Direct, page),
        Err(error) => StrategyResult::failure(StrategyId::Direct, error),
    }
}
