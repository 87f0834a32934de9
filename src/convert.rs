use crate::core::error::ConvertError;
use crate::core::types::{ConversionOptions, ConversionResult, StrategyBody};
use crate::core::AppState;
use crate::extract::{article, jsonld, markdown};
use crate::fetch::orchestrator;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use url::Url;

const CONTENT_TYPE_MARKDOWN: &str = "text/plain; charset=utf-8";
const CONTENT_TYPE_JSON: &str = "application/json";

/// JSON-LD bodies at or below this are teasers; the readability path handles
/// those pages better.
const JSONLD_MIN_CONTENT: usize = 500;

/// Convert a URL into reader-mode Markdown (or a JSON envelope around it).
///
/// Entry point for every front-end. Checks the cache, runs the orchestrator,
/// extracts and renders, stores the result back in the cache.
pub async fn convert(
    state: &Arc<AppState>,
    url: &str,
    options: &ConversionOptions,
) -> Result<ConversionResult, ConvertError> {
    let started = Instant::now();

    let parsed = Url::parse(url.trim()).map_err(|e| ConvertError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConvertError::InvalidUrl {
            url: url.to_string(),
            reason: "URL must use HTTP or HTTPS".to_string(),
        });
    }

    if options.use_cache {
        if let Some(entry) = state.url_cache.get(parsed.as_str()) {
            info!("cache hit for {}", parsed);
            return Ok(ConversionResult {
                content: entry.content,
                strategy: entry.strategy,
                content_type: entry.content_type,
                elapsed_ms: started.elapsed().as_millis() as u64,
                from_cache: true,
                title: entry.title,
            });
        }
    }

    let outcome = orchestrator::orchestrate(state, &parsed, &options.fetch_options()).await?;
    info!(
        "{} delivered {} after {}ms and {} attempt(s)",
        outcome.strategy,
        parsed,
        outcome.elapsed_ms,
        outcome.attempts.len()
    );

    let markdown_source = outcome.body.is_markdown();
    let rendered = match &outcome.body {
        // Reader services already produce Markdown; pass it through untouched.
        StrategyBody::Markdown(md) => Rendered {
            markdown: md.clone(),
            title: outcome.title.clone(),
            author: None,
            date: None,
        },
        StrategyBody::Html(html) => render_html(html, &parsed, options),
    };

    let (content, content_type) = if options.json_format {
        let envelope_title = if markdown_source {
            "Extracted Content".to_string()
        } else {
            rendered
                .title
                .clone()
                .unwrap_or_else(|| "Extracted Content".to_string())
        };
        let date = rendered
            .date
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339());
        let mut envelope = json!({
            "url": parsed.as_str(),
            "title": envelope_title,
            "date": date,
            "content": rendered.markdown,
            "strategy": outcome.strategy,
            "elapsed": outcome.elapsed_ms,
        });
        if let Some(author) = &rendered.author {
            envelope["author"] = json!(author);
        }
        (envelope.to_string(), CONTENT_TYPE_JSON)
    } else {
        (rendered.markdown, CONTENT_TYPE_MARKDOWN)
    };

    if options.use_cache {
        state.url_cache.insert(
            parsed.as_str(),
            content.clone(),
            outcome.strategy.clone(),
            content_type.to_string(),
            rendered.title.clone(),
        );
    }

    Ok(ConversionResult {
        content,
        strategy: outcome.strategy,
        content_type: content_type.to_string(),
        elapsed_ms: started.elapsed().as_millis() as u64,
        from_cache: false,
        title: rendered.title,
    })
}

struct Rendered {
    markdown: String,
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
}

/// HTML → Markdown preference ladder: a substantial JSON-LD article body
/// wins; otherwise readability picks the article and the DOM walker renders
/// it, resolving relative image paths against the page URL.
fn render_html(html: &str, base: &Url, options: &ConversionOptions) -> Rendered {
    if let Some(ld) = jsonld::extract_article(html) {
        if ld.body.len() > JSONLD_MIN_CONTENT {
            info!("json-ld article body used ({} chars)", ld.body.len());
            let markdown = compose(ld.title.as_deref(), ld.author.as_deref(), &ld.body);
            return Rendered {
                markdown,
                title: ld.title,
                author: ld.author,
                date: ld.date,
            };
        }
        warn!(
            "json-ld body too small ({} chars), falling through to readability",
            ld.body.len()
        );
    }

    let article = article::extract(html, base);
    let body_md = markdown::convert(&article.content, base, options.preserve_images);
    let title = {
        let t = article.title.trim();
        (!t.is_empty()).then(|| t.to_string())
    };
    let markdown = compose(title.as_deref(), article.byline.as_deref(), &body_md);
    Rendered {
        markdown,
        title,
        author: article.byline,
        date: None,
    }
}

fn compose(title: Option<&str>, author: Option<&str>, body: &str) -> String {
    let mut out = String::new();
    if let Some(title) = title {
        out.push_str("# ");
        out.push_str(title);
        out.push_str("\n\n");
    }
    if let Some(author) = author {
        out.push_str(&format!("*By {}*\n\n", author));
    }
    out.push_str(body.trim());
    out
}
