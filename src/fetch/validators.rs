use aho_corasick::AhoCorasick;
use std::sync::OnceLock;

/// Bump when editing any table below so drift between deployments is visible
/// in logs and bug reports.
pub const PATTERN_TABLE_VERSION: u32 = 4;

/// Block pages front-load their message; scanning further only finds footer
/// boilerplate and false positives.
const BLOCK_SCAN_WINDOW: usize = 5 * 1024;
const PAYWALL_SCAN_WINDOW: usize = 10 * 1024;

/// Interstitials, CAPTCHA walls, and explicit denials. Case-insensitive.
const BLOCK_PATTERNS: &[&str] = &[
    // Cloudflare and friends
    "checking your browser",
    "just a moment",
    "cloudflare ray id",
    "one more step",
    "attention required",
    "ddos protection",
    "security check to access",
    "enable javascript and cookies",
    // CAPTCHA prompts
    "captcha",
    "robot check",
    "are you a robot",
    "verify you are human",
    "prove you're human",
    "unusual traffic",
    // Explicit denials
    "access denied",
    "403 forbidden",
    "error 1020",
    "request blocked",
    // Google News interstitial served instead of the article redirect
    "opening this page",
    "<title>google news</title>",
];

/// Subscription walls. Sites mark these in CSS hooks (`paywall` classes/ids,
/// `data-paywall` attributes) and call-to-action copy.
const PAYWALL_PATTERNS: &[&str] = &[
    "paywall",
    "subscribe to continue",
    "subscription required",
    "sign up to read",
    "sign in to read",
    "members only",
    "login to view",
    "start your free trial",
    "subscribe now",
    "premium content",
    "to continue reading",
    "already a subscriber",
];

/// Google Search's generic error/redirect page, returned to suspicious
/// clients instead of the requested result.
const GOOGLE_ERROR_PATTERNS: &[&str] = &[
    "if you're having trouble accessing google search",
    "emsg=sg_rel",
];

fn block_matcher() -> &'static AhoCorasick {
    static MATCHER: OnceLock<AhoCorasick> = OnceLock::new();
    MATCHER.get_or_init(|| build_matcher(BLOCK_PATTERNS))
}

fn paywall_matcher() -> &'static AhoCorasick {
    static MATCHER: OnceLock<AhoCorasick> = OnceLock::new();
    MATCHER.get_or_init(|| build_matcher(PAYWALL_PATTERNS))
}

fn google_error_matcher() -> &'static AhoCorasick {
    static MATCHER: OnceLock<AhoCorasick> = OnceLock::new();
    MATCHER.get_or_init(|| build_matcher(GOOGLE_ERROR_PATTERNS))
}

fn build_matcher(patterns: &[&str]) -> AhoCorasick {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(patterns)
        .expect("validator pattern table must compile")
}

fn scan(matcher: &AhoCorasick, html: &str, window: usize) -> bool {
    let prefix = &html.as_bytes()[..window.min(html.len())];
    matcher.is_match(prefix)
}

/// Anti-bot interstitial / denial heuristic over the first 5 KiB.
/// Advisory: a false positive only costs one strategy in a race.
pub fn is_blocked(html: &str) -> bool {
    scan(block_matcher(), html, BLOCK_SCAN_WINDOW)
}

/// Subscription-wall heuristic over the first 10 KiB.
pub fn is_paywalled(html: &str) -> bool {
    scan(paywall_matcher(), html, PAYWALL_SCAN_WINDOW)
}

/// Google Search's own error page, served with HTTP 200.
pub fn is_google_error_page(html: &str) -> bool {
    scan(google_error_matcher(), html, PAYWALL_SCAN_WINDOW)
}
