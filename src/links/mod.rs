//! Context resolution from open tabs
//!
//! Finds the social profile or token chart the user is looking at by
//! scanning tab URLs in browser order.

mod patterns;

pub use patterns::{ContractRef, contract_from_url, username_from_url};

use crate::browser::TabSnapshot;

/// URL scheme of browser extension pages, never inspected
const EXTENSION_SCHEME: &str = "chrome-extension://";

/// Resolved context for an agent lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentContext {
    /// Token contract address from a chart tab
    Contract(String),
    /// Social profile username
    Username(String),
}

/// First profile username found across the tabs
#[must_use]
pub fn find_username(tabs: &TabSnapshot) -> Option<String> {
    inspectable(tabs).find_map(|url| {
        let username = username_from_url(url)?;
        tracing::debug!(username, url, "found username");
        Some(username)
    })
}

/// First token contract address found across the tabs
#[must_use]
pub fn find_contract(tabs: &TabSnapshot) -> Option<String> {
    inspectable(tabs).find_map(|url| {
        let contract = contract_from_url(url)?;
        tracing::debug!(chain = contract.chain, address = contract.address, "found contract");
        Some(contract.address)
    })
}

/// URL of the first token chart tab
#[must_use]
pub fn find_chart_url(tabs: &TabSnapshot) -> Option<String> {
    inspectable(tabs)
        .find(|url| contract_from_url(url).is_some())
        .map(ToString::to_string)
}

/// Context for an agent lookup; a contract tab wins over a profile tab
#[must_use]
pub fn resolve_agent(tabs: &TabSnapshot) -> Option<AgentContext> {
    find_contract(tabs)
        .map(AgentContext::Contract)
        .or_else(|| find_username(tabs).map(AgentContext::Username))
}

fn inspectable(tabs: &TabSnapshot) -> impl Iterator<Item = &str> {
    tabs.iter()
        .map(|t| t.url.as_str())
        .filter(|url| !url.starts_with(EXTENSION_SCHEME))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVM_PAIR: &str = "0xc0041ef357b183448b235a8ea73ce4e4ec8c265f";

    #[test]
    fn test_first_profile_tab_wins() {
        let tabs = TabSnapshot::from_urls([
            "https://example.com",
            "https://x.com/alice",
            "https://twitter.com/bob",
        ]);
        assert_eq!(find_username(&tabs).as_deref(), Some("alice"));
    }

    #[test]
    fn test_no_profile_tab() {
        let tabs = TabSnapshot::from_urls(["https://example.com/alice", "about:blank"]);
        assert_eq!(find_username(&tabs), None);
        assert_eq!(find_contract(&tabs), None);
    }

    #[test]
    fn test_extension_tabs_are_skipped() {
        let tabs = TabSnapshot::from_urls([
            "chrome-extension://abcdef/x.com/alice",
            format!("chrome-extension://abcdef/dexscreener.com/base/{EVM_PAIR}").as_str(),
        ]);
        assert_eq!(find_username(&tabs), None);
        assert_eq!(find_contract(&tabs), None);
        assert_eq!(resolve_agent(&tabs), None);
    }

    #[test]
    fn test_contract_takes_precedence() {
        let chart = format!("https://dexscreener.com/base/{EVM_PAIR}");
        let tabs = TabSnapshot::from_urls(["https://x.com/alice", chart.as_str()]);

        assert_eq!(
            resolve_agent(&tabs),
            Some(AgentContext::Contract(EVM_PAIR.to_string()))
        );
    }

    #[test]
    fn test_username_when_no_contract() {
        let tabs = TabSnapshot::from_urls(["https://dexscreener.com/", "https://x.com/alice"]);
        assert_eq!(
            resolve_agent(&tabs),
            Some(AgentContext::Username("alice".to_string()))
        );
    }

    #[test]
    fn test_chart_url_is_whole_tab_url() {
        let chart = format!("https://dexscreener.com/base/{EVM_PAIR}?embed=1");
        let tabs = TabSnapshot::from_urls([
            "https://x.com/alice",
            "http://localhost:5003/?search=alice",
            chart.as_str(),
        ]);
        assert_eq!(find_chart_url(&tabs), Some(chart));
        assert_eq!(find_chart_url(&TabSnapshot::from_urls(["https://x.com/alice"])), None);
    }

    #[test]
    fn test_empty_snapshot() {
        let tabs = TabSnapshot::default();
        assert_eq!(resolve_agent(&tabs), None);
    }
}
