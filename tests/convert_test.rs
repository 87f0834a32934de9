mod common;

use clearpage::cache::UrlCache;
use clearpage::{convert, AppState, ConversionOptions, ConvertError, StrategyId, StrategyResult};
use common::*;
use std::sync::Arc;
use std::time::Duration;

fn example_domain_html() -> StrategyResult {
    let html = "<html><head><title>Example Domain</title></head><body><div>\
        <h1>Example Domain</h1>\
        <p>This domain is for use in illustrative examples in documents. You may use this \
        domain in literature without prior coordination or asking for permission.</p>\
        <p><a href=\"https://www.iana.org/domains/example\">More information...</a></p>\
        </div></body></html>";
    StrategyResult::html(StrategyId::Direct, html.to_string(), None)
}

#[tokio::test]
async fn direct_page_renders_reader_markdown() {
    let mut runner = MockRunner::new();
    runner.script(StrategyId::Direct, 5, example_domain_html());
    let state = runner.into_state();

    let result = convert(&state, "https://example.com", &ConversionOptions::default())
        .await
        .expect("conversion");
    assert_eq!(result.strategy, "direct");
    assert_eq!(result.content_type, "text/plain; charset=utf-8");
    assert!(result.content.starts_with("# Example Domain"));
    assert!(result.content.contains("illustrative examples"));
    assert!(!result.from_cache);
}

#[tokio::test]
async fn paywalled_direct_loses_to_googlebot() {
    let mut runner = MockRunner::new();
    runner.script(StrategyId::Direct, 10, blocked_html(StrategyId::Direct, 12_000));
    runner.script(StrategyId::Googlebot, 30, clean_html(StrategyId::Googlebot, 20_000));
    let state = runner.into_state();

    let options = ConversionOptions {
        bypass: true,
        ..Default::default()
    };
    let result = convert(&state, "https://paywalled.test/a", &options)
        .await
        .expect("conversion");
    assert_eq!(result.strategy, "googlebot");
}

#[tokio::test]
async fn markdown_winner_passes_through_untouched() {
    let mut runner = MockRunner::new();
    for strategy in [
        StrategyId::Direct,
        StrategyId::Googlebot,
        StrategyId::Facebookbot,
        StrategyId::Bingbot,
    ] {
        runner.script(strategy, 5, shell_html(strategy, 4_096));
    }
    let mut markdown = String::from("# Recovered Article\n\n");
    while markdown.len() < 2_048 {
        markdown.push_str("A paragraph of recovered text that reads like an article. ");
    }
    runner.script(
        StrategyId::Jina,
        5,
        StrategyResult::markdown(
            StrategyId::Jina,
            markdown.clone(),
            Some("Recovered Article".to_string()),
        ),
    );
    let state = runner.into_state();

    let options = ConversionOptions {
        bypass: true,
        ..Default::default()
    };
    let result = convert(&state, "https://spa.test/app", &options)
        .await
        .expect("conversion");
    assert_eq!(result.strategy, "jina");
    // Reader output is served as-is, no re-rendering.
    assert_eq!(result.content, markdown);
    assert_eq!(result.title.as_deref(), Some("Recovered Article"));
}

#[tokio::test]
async fn cache_round_trip_and_expiry() {
    let mut runner = MockRunner::new();
    runner.script(StrategyId::Direct, 5, example_domain_html());
    let calls = runner.calls();
    let state = Arc::new(
        AppState::default()
            .with_strategy_runner(Arc::new(runner))
            .with_url_cache(UrlCache::with_ttl(Duration::from_millis(60))),
    );

    let options = ConversionOptions::default();
    let first = convert(&state, "https://example.com", &options)
        .await
        .expect("first conversion");
    assert!(!first.from_cache);

    let second = convert(&state, "https://example.com", &options)
        .await
        .expect("second conversion");
    assert!(second.from_cache);
    assert_eq!(second.content, first.content);
    assert_eq!(calls.lock().expect("call log").len(), 1);

    tokio::time::sleep(Duration::from_millis(90)).await;
    let third = convert(&state, "https://example.com", &options)
        .await
        .expect("third conversion");
    assert!(!third.from_cache);
    assert_eq!(calls.lock().expect("call log").len(), 2);
}

#[tokio::test]
async fn cache_disabled_refetches() {
    let mut runner = MockRunner::new();
    runner.script(StrategyId::Direct, 5, example_domain_html());
    let calls = runner.calls();
    let state = runner.into_state();

    let options = ConversionOptions {
        use_cache: false,
        ..Default::default()
    };
    for _ in 0..2 {
        let result = convert(&state, "https://example.com", &options)
            .await
            .expect("conversion");
        assert!(!result.from_cache);
    }
    assert_eq!(calls.lock().expect("call log").len(), 2);
}

#[tokio::test]
async fn json_envelope_for_markdown_winner() {
    let mut runner = MockRunner::new();
    runner.script(StrategyId::Jina, 5, markdown_result(StrategyId::Jina, 600));
    let state = runner.into_state();

    let options = ConversionOptions {
        bypass: true,
        strategy: Some(StrategyId::Jina),
        json_format: true,
        ..Default::default()
    };
    let result = convert(&state, "https://example.com/post", &options)
        .await
        .expect("conversion");
    assert_eq!(result.content_type, "application/json");

    let envelope: serde_json::Value =
        serde_json::from_str(&result.content).expect("envelope must be JSON");
    assert_eq!(envelope["url"], "https://example.com/post");
    assert_eq!(envelope["title"], "Extracted Content");
    assert_eq!(envelope["strategy"], "jina");
    assert!(envelope["content"]
        .as_str()
        .is_some_and(|c| c.starts_with("# Recovered Article")));
    assert!(envelope["date"].as_str().is_some_and(|d| !d.is_empty()));
    assert!(envelope["elapsed"].is_number());
}

#[tokio::test]
async fn jsonld_article_wins_over_readability() {
    let body = "Council members spent the evening reviewing the draft budget line by line, \
                pausing twice for public comment. "
        .repeat(12);
    let body = body.trim().to_string();
    assert!(body.len() > 1_000);

    let html = format!(
        "<html><head><script type=\"application/ld+json\">{{\"@type\":\"Article\",\
         \"headline\":\"Budget Night\",\"articleBody\":\"{}\",\
         \"author\":{{\"name\":\"D. Ameyo\"}},\"datePublished\":\"2026-05-12\"}}</script>\
         </head><body><article><p>Unrelated DOM filler that must not appear.</p></article>\
         </body></html>",
        body
    );

    let mut runner = MockRunner::new();
    runner.script(
        StrategyId::Direct,
        5,
        StrategyResult::html(StrategyId::Direct, html, None),
    );
    let state = runner.into_state();

    let options = ConversionOptions {
        json_format: true,
        ..Default::default()
    };
    let result = convert(&state, "https://news.test/budget", &options)
        .await
        .expect("conversion");

    let envelope: serde_json::Value =
        serde_json::from_str(&result.content).expect("envelope must be JSON");
    assert_eq!(envelope["title"], "Budget Night");
    assert_eq!(envelope["author"], "D. Ameyo");
    assert_eq!(envelope["date"], "2026-05-12");
    let content = envelope["content"].as_str().expect("content");
    assert!(content.starts_with("# Budget Night\n\n*By D. Ameyo*\n\n"));
    assert!(content.contains("line by line"));
    assert!(!content.contains("Unrelated DOM filler"));
}

#[tokio::test]
async fn image_handling_follows_preserve_flag() {
    let paragraph = "<p>The gallery reopened after a two year renovation that doubled the \
                     exhibition space and restored the original skylights.</p>";
    let html = format!(
        "<html><head><title>Gallery</title></head><body><article>{}\
         <img src=\"/a/b.png\">{}</article></body></html>",
        paragraph.repeat(4),
        paragraph.repeat(4)
    );

    let mut runner = MockRunner::new();
    runner.script(
        StrategyId::Direct,
        5,
        StrategyResult::html(StrategyId::Direct, html.clone(), None),
    );
    let state = runner.into_state();

    let result = convert(
        &state,
        "https://ex.com/x/y.html",
        &ConversionOptions::default(),
    )
    .await
    .expect("conversion");
    assert!(result.content.contains("![image](https://ex.com/a/b.png)"));

    let mut runner = MockRunner::new();
    runner.script(
        StrategyId::Direct,
        5,
        StrategyResult::html(StrategyId::Direct, html, None),
    );
    let state = runner.into_state();

    let options = ConversionOptions {
        preserve_images: false,
        use_cache: false,
        ..Default::default()
    };
    let result = convert(&state, "https://ex.com/x/y.html", &options)
        .await
        .expect("conversion");
    assert!(!result.content.contains("!["));
}

#[tokio::test]
async fn invalid_urls_rejected_up_front() {
    let state = MockRunner::new().into_state();

    let err = convert(&state, "not a url", &ConversionOptions::default())
        .await
        .expect_err("must reject");
    assert!(matches!(err, ConvertError::InvalidUrl { .. }));

    let err = convert(&state, "ftp://example.com/file", &ConversionOptions::default())
        .await
        .expect_err("must reject scheme");
    assert!(matches!(err, ConvertError::InvalidUrl { .. }));
}

#[tokio::test]
async fn dead_origin_surfaces_aggregated_failure() {
    let state = MockRunner::new().into_state();

    let options = ConversionOptions {
        bypass: true,
        ..Default::default()
    };
    let err = convert(&state, "https://dead.test", &options)
        .await
        .expect_err("must fail");
    let message = err.to_string();
    for name in ["direct", "googlebot", "twelveft", "jina", "exa"] {
        assert!(message.contains(name), "missing {}: {}", name, message);
    }
}

#[tokio::test]
async fn cache_key_is_the_normalized_url() {
    let mut runner = MockRunner::new();
    runner.script(StrategyId::Direct, 5, example_domain_html());
    let calls = runner.calls();
    let state = runner.into_state();

    let options = ConversionOptions::default();
    convert(&state, "https://example.com", &options)
        .await
        .expect("first");
    // Same URL with an explicit trailing slash normalizes identically.
    let second = convert(&state, "https://example.com/", &options)
        .await
        .expect("second");
    assert!(second.from_cache);
    assert_eq!(calls.lock().expect("call log").len(), 1);
}
