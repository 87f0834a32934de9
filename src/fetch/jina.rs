use super::{get_page, stealth};
use crate::core::types::{StrategyId, StrategyResult};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

const READER_PREFIX: &str = "https://r.jina.ai/";

/// Anything shorter is the reader echoing an error, not an article.
const MIN_BODY_BYTES: usize = 50;

fn preamble_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The reader prepends "Title: ...", "URL Source: ..." (and sometimes
    // "Published Time: ...") before a "Markdown Content:" separator.
    RE.get_or_init(|| {
        Regex::new(r"(?s)\ATitle:[ \t]*(?P<title>[^\n]*)\n.*?Markdown Content:\n+")
            .expect("jina preamble pattern must compile")
    })
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^# (.+)$").expect("heading pattern must compile"))
}

/// Jina Reader strategy: `r.jina.ai/<url>` renders the page server-side and
/// returns ready Markdown.
pub async fn fetch(client: &reqwest::Client, url: &Url) -> StrategyResult {
    let reader_url = format!("{}{}", READER_PREFIX, url);
    let reader_url = match Url::parse(&reader_url) {
        Ok(u) => u,
        Err(e) => {
            return StrategyResult::failure(
                StrategyId::Jina,
                format!("failed to build reader URL: {}", e),
            )
        }
    };

    debug!("jina fetch via {}", reader_url);
    let page = match get_page(
        client,
        reader_url,
        stealth::random_desktop_user_agent(),
        &[("Accept", "text/plain".to_string())],
    )
    .await
    {
        Ok(page) => page,
        Err(error) => return StrategyResult::failure(StrategyId::Jina, error),
    };

    if !(200..300).contains(&page.status) {
        return StrategyResult::failure(StrategyId::Jina, format!("HTTP status {}", page.status));
    }
    if page.body.len() < MIN_BODY_BYTES {
        return StrategyResult::failure(
            StrategyId::Jina,
            format!("reader body too short ({} bytes)", page.body.len()),
        );
    }

    let (markdown, title) = strip_preamble(&page.body);
    StrategyResult::markdown(StrategyId::Jina, markdown, title)
}

/// Drop the `Title: … Markdown Content:` preamble when present. The returned
/// title prefers the first ATX heading of the body, falling back to the
/// preamble's Title line.
pub(crate) fn strip_preamble(body: &str) -> (String, Option<String>) {
    let mut preamble_title = None;
    let markdown = match preamble_re().captures(body) {
        Some(caps) => {
            let t = caps
                .name("title")
                .map(|m| m.as_str().trim().to_string())
                .filter(|t| !t.is_empty());
            preamble_title = t;
            body[caps.get(0).map(|m| m.end()).unwrap_or(0)..].to_string()
        }
        None => body.to_string(),
    };

    let heading_title = heading_re()
        .captures(&markdown)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());

    (markdown, heading_title.or(preamble_title))
}
