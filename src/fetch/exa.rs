use crate::core::types::{StrategyId, StrategyResult};
use crate::core::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

const MCP_ENDPOINT: &str = "https://mcp.exa.ai/mcp?tools=crawling_exa";
const PROTOCOL_VERSION: &str = "2024-11-05";
const MAX_CHARACTERS: u64 = 50_000;

/// Tool-level failure markers Exa embeds in otherwise-successful responses.
const FAILURE_SIGNALS: &[&str] = &[
    "CRAWL_LIVECRAWL_TIMEOUT",
    "CRAWL_TIMEOUT",
    "CRAWL_NOT_FOUND",
    "CRAWL_UNKNOWN_ERROR",
];

/// Exa crawling strategy, spoken over the hosted MCP endpoint: one
/// `initialize` to mint a session, then `tools/call` with `crawling_exa`.
/// The session id lives on `AppState` and is cleared on any error so the
/// next call re-initializes; concurrent initializes are harmless, each call
/// simply adopts the latest id the server returned.
pub async fn fetch(state: &Arc<AppState>, url: &Url) -> StrategyResult {
    match crawl(state, url).await {
        Ok((markdown, title)) => StrategyResult::markdown(StrategyId::Exa, markdown, title),
        Err(error) => {
            *state.exa_session.lock().await = None;
            StrategyResult::failure(StrategyId::Exa, error)
        }
    }
}

async fn crawl(state: &Arc<AppState>, url: &Url) -> Result<(String, Option<String>), String> {
    let session = ensure_session(state).await?;

    let request = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": {
            "name": "crawling_exa",
            "arguments": {
                "url": url.as_str(),
                "maxCharacters": MAX_CHARACTERS,
            }
        }
    });

    debug!("exa tools/call for {}", url);
    let response = state
        .http_client
        .post(MCP_ENDPOINT)
        .header("Accept", "application/json, text/event-stream")
        .header("mcp-session-id", &session)
        .json(&request)
        .send()
        .await
        .map_err(|e| format!("request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("HTTP status {}", response.status().as_u16()));
    }
    remember_session(state, &response).await;

    let raw = response
        .text()
        .await
        .map_err(|e| format!("failed to read response body: {}", e))?;
    let frame = parse_sse_data(&raw).ok_or("no data frame in MCP response")?;
    let envelope: Value =
        serde_json::from_str(&frame).map_err(|e| format!("bad JSON-RPC frame: {}", e))?;

    if let Some(error) = envelope.get("error") {
        return Err(format!("JSON-RPC error: {}", error));
    }
    let text = envelope
        .pointer("/result/content/0/text")
        .and_then(Value::as_str)
        .ok_or("MCP result carries no text content")?;

    for signal in FAILURE_SIGNALS {
        if text.contains(signal) {
            return Err(format!("crawl failed: {}", signal));
        }
    }

    Ok(parse_tool_text(text))
}

/// `content[0].text` is either the crawl JSON (`{"results":[...]}`) or, for
/// some pages, already plain text.
fn parse_tool_text(text: &str) -> (String, Option<String>) {
    if let Ok(inner) = serde_json::from_str::<Value>(text) {
        if let Some(first) = inner
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
        {
            let body = first
                .get("text")
                .or_else(|| first.get("content"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            if !body.trim().is_empty() {
                let title = first
                    .get("title")
                    .and_then(Value::as_str)
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty());
                return (body.to_string(), title);
            }
        }
    }
    (text.to_string(), None)
}

async fn ensure_session(state: &Arc<AppState>) -> Result<String, String> {
    if let Some(session) = state.exa_session.lock().await.clone() {
        return Ok(session);
    }

    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        }
    });

    debug!("exa initialize (no live session)");
    let response = state
        .http_client
        .post(MCP_ENDPOINT)
        .header("Accept", "application/json, text/event-stream")
        .json(&request)
        .send()
        .await
        .map_err(|e| format!("initialize failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!(
            "initialize returned HTTP status {}",
            response.status().as_u16()
        ));
    }

    let session = response
        .headers()
        .get("mcp-session-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or("initialize returned no mcp-session-id header")?;

    *state.exa_session.lock().await = Some(session.clone());
    Ok(session)
}

/// Adopt whatever session id the server echoed back; duplicate writes from
/// racing calls are fine, latest wins.
async fn remember_session(state: &Arc<AppState>, response: &reqwest::Response) {
    if let Some(session) = response
        .headers()
        .get("mcp-session-id")
        .and_then(|v| v.to_str().ok())
    {
        let mut slot = state.exa_session.lock().await;
        if slot.as_deref() != Some(session) {
            warn!("exa session id rotated by server");
            *slot = Some(session.to_string());
        }
    }
}

/// Pull the JSON payload out of an SSE-framed response body
/// (`event: message\ndata: {...}\n\n`).
pub(crate) fn parse_sse_data(raw: &str) -> Option<String> {
    for line in raw.lines() {
        if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            if !data.is_empty() {
                return Some(data.to_string());
            }
        }
    }
    // Some gateways answer plain JSON without SSE framing.
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return Some(trimmed.to_string());
    }
    None
}
