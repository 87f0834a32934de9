use super::{get_page, stealth};
use crate::core::types::{StrategyId, StrategyResult};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use tracing::debug;
use url::Url;

const AVAILABILITY_API: &str = "https://archive.org/wayback/available";
const SNAPSHOT_PREFIX: &str = "https://web.archive.org/web/";

#[derive(Debug, Deserialize)]
struct WaybackAvailable {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<ClosestSnapshot>,
}

#[derive(Debug, Deserialize)]
struct ClosestSnapshot {
    url: String,
    // Wayback reports the snapshot's original HTTP status as a string.
    #[serde(default)]
    status: String,
    #[serde(default)]
    timestamp: String,
}

/// Internet Archive strategy: ask the availability API for the closest good
/// snapshot, fall back to the generic `/web/<url>` redirect when the API has
/// nothing. Snapshot HTML is returned verbatim.
pub async fn fetch(client: &reqwest::Client, url: &Url) -> StrategyResult {
    let user_agent = stealth::random_desktop_user_agent();

    if let Some(snapshot) = lookup_snapshot(client, url, user_agent).await {
        debug!(
            "wayback closest snapshot {} ({})",
            snapshot.url, snapshot.timestamp
        );
        match fetch_snapshot(client, &snapshot.url, user_agent).await {
            Ok(html) => return StrategyResult::html(StrategyId::Archive, html, None),
            Err(error) => debug!("closest snapshot fetch failed: {}", error),
        }
    }

    // No usable availability answer: the /web/ endpoint redirects to the
    // newest capture on its own.
    let direct = format!("{}{}", SNAPSHOT_PREFIX, url);
    match fetch_snapshot(client, &direct, user_agent).await {
        Ok(html) => StrategyResult::html(StrategyId::Archive, html, None),
        Err(error) => StrategyResult::failure(StrategyId::Archive, error),
    }
}

async fn lookup_snapshot(
    client: &reqwest::Client,
    url: &Url,
    user_agent: &str,
) -> Option<ClosestSnapshot> {
    let api = format!(
        "{}?url={}",
        AVAILABILITY_API,
        utf8_percent_encode(url.as_str(), NON_ALPHANUMERIC)
    );

    let response = client
        .get(api.as_str())
        .header("User-Agent", user_agent)
        .send()
        .await
        .ok()?;
    if !response.status().is_success() {
        return None;
    }

    let available: WaybackAvailable = response.json().await.ok()?;
    let closest = available.archived_snapshots.closest?;
    if closest.status != "200" || closest.url.is_empty() {
        return None;
    }
    Some(closest)
}

async fn fetch_snapshot(
    client: &reqwest::Client,
    snapshot_url: &str,
    user_agent: &str,
) -> Result<String, String> {
    let parsed =
        Url::parse(snapshot_url).map_err(|e| format!("bad snapshot URL '{}': {}", snapshot_url, e))?;
    let page = get_page(client, parsed, user_agent, &[]).await?;
    if !(200..300).contains(&page.status) {
        return Err(format!("HTTP status {}", page.status));
    }
    Ok(page.body)
}
