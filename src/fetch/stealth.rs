/// Impersonation tables for the bypass strategies: realistic desktop browser
/// user agents plus the crawler identities (and spoofable source IPs) of the
/// indexers that paywalled sites whitelist.

/// Collection of realistic desktop user agents for rotation
pub const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

pub const GOOGLEBOT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
    "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; Googlebot/2.1; +http://www.google.com/bot.html) Chrome/120.0.0.0 Safari/537.36",
    "Googlebot/2.1 (+http://www.google.com/bot.html)",
];

/// Google-owned crawler IPv4 literals for the X-Forwarded-For spoof.
pub const GOOGLEBOT_IPS: &[&str] = &[
    "66.249.66.1",
    "66.249.66.8",
    "66.249.64.23",
    "66.249.65.34",
    "66.249.79.12",
    "66.249.72.5",
];

pub const BINGBOT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
    "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm) Chrome/116.0.1938.76 Safari/537.36",
];

/// Microsoft-owned crawler IPv4 literals.
pub const BINGBOT_IPS: &[&str] = &[
    "157.55.39.1",
    "157.55.39.104",
    "207.46.13.52",
    "207.46.13.136",
    "40.77.167.25",
];

pub const FACEBOOKBOT_USER_AGENTS: &[&str] = &[
    "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)",
    "facebookexternalhit/1.1",
    "Facebot/1.0",
];

fn pick(pool: &'static [&'static str]) -> &'static str {
    use rand::RngExt;
    let mut rng = rand::rng();
    let index = rng.random_range(0..pool.len());
    pool[index]
}

/// Get a random desktop user agent string for stealth
pub fn random_desktop_user_agent() -> &'static str {
    pick(DESKTOP_USER_AGENTS)
}

pub fn random_googlebot_user_agent() -> &'static str {
    pick(GOOGLEBOT_USER_AGENTS)
}

pub fn random_googlebot_ip() -> &'static str {
    pick(GOOGLEBOT_IPS)
}

pub fn random_bingbot_user_agent() -> &'static str {
    pick(BINGBOT_USER_AGENTS)
}

pub fn random_bingbot_ip() -> &'static str {
    pick(BINGBOT_IPS)
}

pub fn random_facebookbot_user_agent() -> &'static str {
    pick(FACEBOOKBOT_USER_AGENTS)
}

/// Additional stealth headers to avoid bot detection on the direct fetch.
/// Crawler impersonations deliberately omit these: real indexers do not send
/// Sec-Fetch-* hints.
pub fn stealth_headers() -> Vec<(String, String)> {
    vec![
        ("Accept".to_string(), "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".to_string()),
        ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
        ("Accept-Encoding".to_string(), "gzip, deflate, br".to_string()),
        ("DNT".to_string(), "1".to_string()),
        ("Connection".to_string(), "keep-alive".to_string()),
        ("Upgrade-Insecure-Requests".to_string(), "1".to_string()),
        ("Sec-Fetch-Dest".to_string(), "document".to_string()),
        ("Sec-Fetch-Mode".to_string(), "navigate".to_string()),
        ("Sec-Fetch-Site".to_string(), "none".to_string()),
        ("Cache-Control".to_string(), "max-age=0".to_string()),
    ]
}
