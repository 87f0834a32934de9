use crate::core::types::Article;
use readability::extractor;
use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

/// Score the document with readability and package the winner as an
/// `Article`, enriched with byline/site-name/excerpt from the meta tags.
/// When scoring fails or comes back empty, fall back to the whole `<body>`
/// with the `<title>` (or first `<h1>`) as the title; downstream conversion
/// still produces something readable.
pub fn extract(html: &str, base: &Url) -> Article {
    let document = Html::parse_document(html);
    let byline = extract_byline(&document);
    let site_name = extract_site_name(&document);
    let excerpt = extract_excerpt(&document);

    match extractor::extract(&mut html.as_bytes(), base) {
        Ok(product) if !product.content.trim().is_empty() => {
            let title = if product.title.trim().is_empty() {
                extract_title(&document)
            } else {
                product.title
            };
            Article {
                title,
                content: product.content,
                byline,
                site_name,
                excerpt,
            }
        }
        Ok(_) => {
            warn!("readability returned empty content, using body fallback");
            fallback_article(&document, byline, site_name, excerpt)
        }
        Err(e) => {
            warn!("readability extraction failed: {}, using body fallback", e);
            fallback_article(&document, byline, site_name, excerpt)
        }
    }
}

fn fallback_article(
    document: &Html,
    byline: Option<String>,
    site_name: Option<String>,
    excerpt: Option<String>,
) -> Article {
    let content = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|body| body.inner_html())
        .unwrap_or_default();

    Article {
        title: extract_title(document),
        content,
        byline,
        site_name,
        excerpt,
    }
}

/// Page title with fallback to the first h1.
fn extract_title(document: &Html) -> String {
    if let Ok(selector) = Selector::parse("title") {
        if let Some(element) = document.select(&selector).next() {
            let title = element.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                return title;
            }
        }
    }

    if let Ok(selector) = Selector::parse("h1") {
        if let Some(element) = document.select(&selector).next() {
            let text = element.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return text;
            }
        }
    }

    "No Title".to_string()
}

fn extract_byline(document: &Html) -> Option<String> {
    for selector in ["meta[name=\"author\"]", "meta[property=\"article:author\"]"] {
        if let Ok(sel) = Selector::parse(selector) {
            if let Some(el) = document.select(&sel).next() {
                if let Some(content) = el.value().attr("content") {
                    let v = content.trim();
                    if !v.is_empty() {
                        return Some(v.to_string());
                    }
                }
            }
        }
    }
    None
}

fn extract_site_name(document: &Html) -> Option<String> {
    if let Ok(sel) = Selector::parse("meta[property=\"og:site_name\"]") {
        if let Some(el) = document.select(&sel).next() {
            if let Some(content) = el.value().attr("content") {
                let v = content.trim();
                if !v.is_empty() {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

fn extract_excerpt(document: &Html) -> Option<String> {
    for selector in [
        "meta[name=\"description\"]",
        "meta[property=\"og:description\"]",
    ] {
        if let Ok(sel) = Selector::parse(selector) {
            if let Some(el) = document.select(&sel).next() {
                if let Some(content) = el.value().attr("content") {
                    let v = content.trim();
                    if !v.is_empty() {
                        return Some(v.to_string());
                    }
                }
            }
        }
    }
    None
}
