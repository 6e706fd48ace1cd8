//! URL patterns for profile and token chart pages

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Hosts that serve social profiles at `/<username>`
const PROFILE_HOSTS: [&str; 2] = ["twitter.com", "x.com"];

/// Host that serves token charts at `/<chain>/<address>`
const CHART_HOST: &str = "dexscreener.com";

/// First path segments on profile hosts that are site pages, not users
const RESERVED_SEGMENTS: [&str; 14] = [
    "home",
    "explore",
    "search",
    "notifications",
    "messages",
    "i",
    "settings",
    "compose",
    "hashtag",
    "intent",
    "login",
    "logout",
    "signup",
    "share",
];

/// Chart path: chain slug followed by a pair/contract address
///
/// One general pattern covers every chain; chain-specific forms such as
/// `/ethereum/0x…` or `/solana/<base58>` are instances of it.
static CHART_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([a-z0-9-]+)/([A-Za-z0-9]{20,})/?$").expect("valid regex")
});

/// Contract found on a chart page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractRef {
    /// Chain slug from the URL (e.g. "base", "solana")
    pub chain: String,
    /// Pair or contract address
    pub address: String,
}

/// Username from a profile page URL
#[must_use]
pub fn username_from_url(raw: &str) -> Option<String> {
    let url = parse_web_url(raw)?;
    if !host_matches(&url, &PROFILE_HOSTS) {
        return None;
    }

    let segment = url.path_segments()?.next()?.trim_start_matches('@');
    if segment.is_empty() || RESERVED_SEGMENTS.contains(&segment.to_lowercase().as_str()) {
        return None;
    }

    Some(segment.to_string())
}

/// Contract address from a token chart URL
#[must_use]
pub fn contract_from_url(raw: &str) -> Option<ContractRef> {
    let url = parse_web_url(raw)?;
    if !host_matches(&url, &[CHART_HOST]) {
        return None;
    }

    let caps = CHART_PATH.captures(url.path())?;
    Some(ContractRef {
        chain: caps[1].to_string(),
        address: caps[2].to_string(),
    })
}

fn parse_web_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Host equals one of `hosts`, ignoring `www.` and `mobile.` prefixes
fn host_matches(url: &Url, hosts: &[&str]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("mobile."))
        .unwrap_or(host);
    hosts.contains(&host)
}
