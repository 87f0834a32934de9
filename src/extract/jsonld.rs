use crate::core::types::JsonLdArticle;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;

/// Schema.org types that carry a full article body.
const ARTICLE_TYPES: &[&str] = &[
    "Article",
    "NewsArticle",
    "BlogPosting",
    "WebPage",
    "ReportageNewsArticle",
];

/// Anything shorter is a teaser or a schema stub, not the article.
const MIN_BODY_CHARS: usize = 200;

/// Walk every `<script type="application/ld+json">` and return the first
/// article-typed object with a substantial body. Parse errors skip the
/// script; modern sites routinely ship several blocks where only one is the
/// article.
pub fn extract_article(html: &str) -> Option<JsonLdArticle> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script[type='application/ld+json']").ok()?;

    for script in document.select(&selector) {
        let json_text = script.inner_html();
        if json_text.trim().is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(&json_text) else {
            debug!("skipping unparseable JSON-LD block");
            continue;
        };

        let mut candidates = Vec::new();
        flatten(&value, &mut candidates);
        for object in candidates {
            if let Some(article) = article_from_object(object) {
                return Some(article);
            }
        }
    }
    None
}

/// Flatten top-level arrays and `@graph` containers into a candidate list.
fn flatten<'a>(value: &'a Value, out: &mut Vec<&'a Map<String, Value>>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten(item, out);
            }
        }
        Value::Object(map) => {
            out.push(map);
            if let Some(graph) = map.get("@graph") {
                flatten(graph, out);
            }
        }
        _ => {}
    }
}

fn article_from_object(map: &Map<String, Value>) -> Option<JsonLdArticle> {
    if !is_article_type(map.get("@type")?) {
        return None;
    }

    let body = body_text(map)?;
    let title = string_value(map.get("headline")).or_else(|| string_value(map.get("name")));
    let author = author_name(map.get("author"));
    let date =
        string_value(map.get("datePublished")).or_else(|| string_value(map.get("dateModified")));

    Some(JsonLdArticle {
        title,
        body,
        author,
        date,
    })
}

/// `@type` may be a string or an array; an array is judged by its first
/// element.
fn is_article_type(value: &Value) -> bool {
    let type_name = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.first().and_then(Value::as_str),
        _ => None,
    };
    type_name.is_some_and(|t| ARTICLE_TYPES.contains(&t))
}

/// `articleBody` (joined with spaces when it is an array) or `text`, gated on
/// trimmed length.
fn body_text(map: &Map<String, Value>) -> Option<String> {
    let body = match map.get("articleBody") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        _ => None,
    };
    let body = body.or_else(|| string_value(map.get("text")))?;
    let trimmed = body.trim();
    if trimmed.len() < MIN_BODY_CHARS {
        return None;
    }
    Some(trimmed.to_string())
}

fn string_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(|item| string_value(Some(item))),
        _ => None,
    }
}

/// `author` is a string, an object with a `name`, or an array of either; an
/// array contributes its first usable element.
fn author_name(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        Value::Array(items) => items.iter().find_map(|item| author_name(Some(item))),
        other => {
            let rendered = other.to_string();
            (!rendered.is_empty() && rendered != "null").then_some(rendered)
        }
    }
}
