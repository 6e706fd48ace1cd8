//! Sources of agent metrics

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use super::AgentMetrics;
use crate::browser::{self, BrowserContext};
use crate::executor::NO_AGENT_PROMPT;
use crate::integrations::BackendClient;
use crate::links::{self, AgentContext};
use crate::{Error, Result};

/// Stat card captions of the agent details page
pub mod labels {
    pub const MINDSHARE: &str = "Mindshare";
    pub const MARKET_CAP: &str = "Market Cap";
    pub const VOLUME_24H: &str = "24h Volume";
    pub const HOLDERS: &str = "Holders";
    pub const LIQUIDITY: &str = "Liquidity";
}

/// Number with optional sign, thousands separators and magnitude suffix
static DISPLAY_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([+-]?)\$?\s*(\d[\d,]*(?:\.\d+)?|\.\d+)\s*([kmb])?\b").expect("valid regex")
});

/// Supplies the metrics a recommendation is scored on
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Metrics of the agent the user is looking at
    async fn metrics(&self, browser: &dyn BrowserContext) -> Result<AgentMetrics>;
}

/// Reads metrics from the rendered agent details page
#[derive(Debug, Clone)]
pub struct PageMetrics {
    wait: Duration,
}

impl PageMetrics {
    /// Wait up to `wait` for the details page to render
    #[must_use]
    pub const fn new(wait: Duration) -> Self {
        Self { wait }
    }
}

#[async_trait]
impl MetricsProvider for PageMetrics {
    async fn metrics(&self, browser: &dyn BrowserContext) -> Result<AgentMetrics> {
        let mindshare = browser::wait_for_label(browser, labels::MINDSHARE, self.wait)
            .await
            .map_err(|e| Error::Ui(format!("agent details page not open: {e}")))?;
        let mindshare = parse_stat_card(&mindshare);
        let market_cap = read_card(browser, labels::MARKET_CAP).await;
        let volume = read_card(browser, labels::VOLUME_24H).await;
        let holders = read_card(browser, labels::HOLDERS).await;
        let liquidity = read_card(browser, labels::LIQUIDITY).await;

        Ok(AgentMetrics {
            mindshare: mindshare.value,
            mindshare_delta_percent: mindshare.delta_percent,
            market_cap: market_cap.value,
            market_cap_delta_percent: market_cap.delta_percent,
            volume_24_hours: volume.value,
            holders_count: holders.value,
            holders_count_delta_percent: holders.delta_percent,
            liquidity: liquidity.value,
        })
    }
}

/// Value and change shown on one stat card; zero when not shown
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatCard {
    pub value: f64,
    pub delta_percent: f64,
}

/// Missing or unreadable cards count as zero
async fn read_card(browser: &dyn BrowserContext, label: &str) -> StatCard {
    match browser.read_labelled(label).await {
        Ok(text) => parse_stat_card(&text),
        Err(e) => {
            tracing::debug!(label, error = %e, "stat card not found");
            StatCard::default()
        }
    }
}

/// Parse a stat card's text: caption, value, then an optional `%` change
///
/// `"Market Cap\n$1,000,000\n-5.00%"` has value 1 000 000 and change -5.
#[must_use]
pub fn parse_stat_card(text: &str) -> StatCard {
    let mut value = None;
    let mut delta = None;

    for line in text.lines().skip(1).map(str::trim) {
        if line.ends_with('%') {
            delta = delta.or_else(|| parse_display_number(line));
        } else {
            value = value.or_else(|| parse_display_number(line));
        }
    }

    if value.is_none() {
        tracing::debug!(text, "stat card has no value");
    }
    StatCard {
        value: value.unwrap_or_default(),
        delta_percent: delta.unwrap_or_default(),
    }
}

/// Fetches the agent record from the backend
#[derive(Debug, Clone)]
pub struct BackendMetrics {
    backend: BackendClient,
}

impl BackendMetrics {
    #[must_use]
    pub const fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl MetricsProvider for BackendMetrics {
    async fn metrics(&self, browser: &dyn BrowserContext) -> Result<AgentMetrics> {
        let tabs = browser::snapshot(browser).await?;
        let agent = match links::resolve_agent(&tabs) {
            Some(AgentContext::Contract(address)) => self.backend.agent_by_contract(&address).await?,
            Some(AgentContext::Username(username)) => self.backend.agent(&username).await?,
            None => return Err(Error::Resolution(NO_AGENT_PROMPT.to_string())),
        };

        tracing::debug!(agent = agent.agent_name, "metrics fetched from backend");
        Ok(agent.metrics)
    }
}

/// Parse numbers as the frontend renders them
///
/// Handles currency signs, percentages, explicit signs, thousands separators
/// and `K`/`M`/`B` suffixes: `"$1.2M"` is 1 200 000 and `"-3.4%"` is -3.4.
#[must_use]
pub fn parse_display_number(text: &str) -> Option<f64> {
    let normalized = text.replace('\u{2212}', "-");
    let caps = DISPLAY_NUMBER.captures(&normalized)?;

    let value: f64 = caps[2].replace(',', "").parse().ok()?;
    let scale = match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
        Some("k") => 1e3,
        Some("m") => 1e6,
        Some("b") => 1e9,
        _ => 1.0,
    };
    let sign = if &caps[1] == "-" { -1.0 } else { 1.0 };

    Some(sign * value * scale)
}
