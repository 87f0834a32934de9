use serde::{Deserialize, Serialize};

/// Closed set of fetch strategies the orchestrator can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyId {
    Direct,
    Googlebot,
    Facebookbot,
    Bingbot,
    Archive,
    Twelveft,
    Jina,
    Exa,
    Googlenews,
}

impl StrategyId {
    pub fn parse_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" => Some(StrategyId::Direct),
            "googlebot" => Some(StrategyId::Googlebot),
            "facebookbot" => Some(StrategyId::Facebookbot),
            "bingbot" => Some(StrategyId::Bingbot),
            "archive" => Some(StrategyId::Archive),
            "twelveft" | "12ft" => Some(StrategyId::Twelveft),
            "jina" => Some(StrategyId::Jina),
            "exa" => Some(StrategyId::Exa),
            "googlenews" => Some(StrategyId::Googlenews),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Direct => "direct",
            StrategyId::Googlebot => "googlebot",
            StrategyId::Facebookbot => "facebookbot",
            StrategyId::Bingbot => "bingbot",
            StrategyId::Archive => "archive",
            StrategyId::Twelveft => "twelveft",
            StrategyId::Jina => "jina",
            StrategyId::Exa => "exa",
            StrategyId::Googlenews => "googlenews",
        }
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a successful strategy run. Strategies produce either raw HTML
/// (needing the extraction pipeline) or ready Markdown (reader services).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyBody {
    Html(String),
    Markdown(String),
}

impl StrategyBody {
    pub fn len(&self) -> usize {
        match self {
            StrategyBody::Html(s) | StrategyBody::Markdown(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_str(&self) -> &str {
        match self {
            StrategyBody::Html(s) | StrategyBody::Markdown(s) => s.as_str(),
        }
    }

    pub fn is_markdown(&self) -> bool {
        matches!(self, StrategyBody::Markdown(_))
    }
}

#[derive(Debug, Clone)]
pub enum StrategyOutcome {
    Fetched {
        body: StrategyBody,
        title: Option<String>,
    },
    Failed {
        error: String,
    },
}

/// Uniform record every adapter returns. Adapters never raise: transport
/// errors, bad statuses, and validator rejections all land in `Failed`.
#[derive(Debug, Clone)]
pub struct StrategyResult {
    pub strategy: StrategyId,
    /// Reported label when it differs from `strategy`: the re-entrant
    /// googlenews adapter reports `googlenews-<inner>`.
    pub label: Option<String>,
    pub outcome: StrategyOutcome,
}

impl StrategyResult {
    /// Successful HTML result. An empty body is coerced to a failure so the
    /// success-implies-non-empty invariant holds by construction.
    pub fn html(strategy: StrategyId, html: String, title: Option<String>) -> Self {
        if html.trim().is_empty() {
            return Self::failure(strategy, "empty response body");
        }
        Self {
            strategy,
            label: None,
            outcome: StrategyOutcome::Fetched {
                body: StrategyBody::Html(html),
                title,
            },
        }
    }

    /// Successful Markdown result, same non-empty guard as `html`.
    pub fn markdown(strategy: StrategyId, markdown: String, title: Option<String>) -> Self {
        if markdown.trim().is_empty() {
            return Self::failure(strategy, "empty response body");
        }
        Self {
            strategy,
            label: None,
            outcome: StrategyOutcome::Fetched {
                body: StrategyBody::Markdown(markdown),
                title,
            },
        }
    }

    pub fn failure(strategy: StrategyId, error: impl Into<String>) -> Self {
        Self {
            strategy,
            label: None,
            outcome: StrategyOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label used in attempt logs and outcomes.
    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.strategy.as_str().to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StrategyOutcome::Fetched { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            StrategyOutcome::Failed { error } => Some(error),
            StrategyOutcome::Fetched { .. } => None,
        }
    }
}

/// One entry of the orchestrator's completion-ordered attempt log.
/// `strategy` is a string rather than a `StrategyId` so composite labels
/// (`googlenews-archive`) survive the round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StrategyAttempt {
    pub fn ok(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            error: None,
        }
    }

    pub fn failed(strategy: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            error: Some(error.into()),
        }
    }
}

/// What the orchestrator hands back to the conversion façade.
#[derive(Debug, Clone)]
pub struct OrchestratorOutcome {
    pub strategy: String,
    pub elapsed_ms: u64,
    pub attempts: Vec<StrategyAttempt>,
    pub body: StrategyBody,
    pub title: Option<String>,
}

/// Orchestrator-level subset of the conversion options.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub bypass: bool,
    pub strategy: Option<StrategyId>,
}

fn default_true() -> bool {
    true
}

/// Recognized conversion options. Front-ends (CLI flags, RPC arguments, query
/// strings) all deserialize into this one record; absent fields take the
/// documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOptions {
    #[serde(default)]
    pub bypass: bool,
    #[serde(default)]
    pub strategy: Option<StrategyId>,
    #[serde(default = "default_true")]
    pub preserve_images: bool,
    #[serde(default)]
    pub json_format: bool,
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            bypass: false,
            strategy: None,
            preserve_images: true,
            json_format: false,
            use_cache: true,
        }
    }
}

impl ConversionOptions {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            bypass: self.bypass,
            strategy: self.strategy,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub content: String,
    pub strategy: String,
    pub content_type: String,
    pub elapsed_ms: u64,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Reader-mode article as produced by the readability extractor (or the
/// whole-body fallback). `content` is an HTML fragment, not Markdown.
#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub byline: Option<String>,
    pub site_name: Option<String>,
    pub excerpt: Option<String>,
}

/// Article-typed JSON-LD payload pulled out of a `<script type="application/ld+json">`.
#[derive(Debug, Clone)]
pub struct JsonLdArticle {
    pub title: Option<String>,
    pub body: String,
    pub author: Option<String>,
    pub date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_id_round_trip() {
        for id in [
            StrategyId::Direct,
            StrategyId::Googlebot,
            StrategyId::Facebookbot,
            StrategyId::Bingbot,
            StrategyId::Archive,
            StrategyId::Twelveft,
            StrategyId::Jina,
            StrategyId::Exa,
            StrategyId::Googlenews,
        ] {
            assert_eq!(StrategyId::parse_str(id.as_str()), Some(id));
        }
        assert_eq!(StrategyId::parse_str("12ft"), Some(StrategyId::Twelveft));
        assert_eq!(StrategyId::parse_str("headless"), None);
    }

    #[test]
    fn test_empty_body_is_failure() {
        let res = StrategyResult::html(StrategyId::Direct, "   ".to_string(), None);
        assert!(!res.is_success());
        assert_eq!(res.error(), Some("empty response body"));

        let res = StrategyResult::markdown(StrategyId::Jina, "# Hi".to_string(), None);
        assert!(res.is_success());
        assert!(res.error().is_none());
    }

    #[test]
    fn test_options_defaults() {
        let opts: ConversionOptions = serde_json::from_str("{}").expect("empty options");
        assert!(!opts.bypass);
        assert!(opts.preserve_images);
        assert!(!opts.json_format);
        assert!(opts.use_cache);
        assert!(opts.strategy.is_none());

        let opts: ConversionOptions =
            serde_json::from_str(r#"{"bypass":true,"strategy":"jina"}"#).expect("options");
        assert!(opts.bypass);
        assert_eq!(opts.strategy, Some(StrategyId::Jina));
    }
}
