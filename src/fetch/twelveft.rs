use super::{get_page, stealth};
use crate::core::types::{StrategyId, StrategyResult};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tracing::debug;
use url::Url;

const PROXY_ENDPOINT: &str = "https://12ft.io/proxy";

/// 12ft.io paywall proxy. Only the service's own failure phrases are checked
/// here; its responses are the target's HTML and go through the regular
/// validators at race level.
pub async fn fetch(client: &reqwest::Client, url: &Url) -> StrategyResult {
    let proxied = format!(
        "{}?q={}",
        PROXY_ENDPOINT,
        utf8_percent_encode(url.as_str(), NON_ALPHANUMERIC)
    );
    let proxied = match Url::parse(&proxied) {
        Ok(u) => u,
        Err(e) => {
            return StrategyResult::failure(
                StrategyId::Twelveft,
                format!("failed to build proxy URL: {}", e),
            )
        }
    };

    debug!("twelveft fetch via {}", proxied);
    let page = match get_page(
        client,
        proxied,
        stealth::random_desktop_user_agent(),
        &[("Referer", "https://12ft.io/".to_string())],
    )
    .await
    {
        Ok(page) => page,
        Err(error) => return StrategyResult::failure(StrategyId::Twelveft, error),
    };

    if !(200..300).contains(&page.status) {
        return StrategyResult::failure(
            StrategyId::Twelveft,
            format!("HTTP status {}", page.status),
        );
    }

    let lower = page.body.to_lowercase();
    if lower.contains("rate limit exceeded") {
        return StrategyResult::failure(StrategyId::Twelveft, "proxy rate limit exceeded");
    }
    if lower.contains("blocked") {
        return StrategyResult::failure(StrategyId::Twelveft, "proxy reports target blocked");
    }

    StrategyResult::html(StrategyId::Twelveft, page.body, None)
}
