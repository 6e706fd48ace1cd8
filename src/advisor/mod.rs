//! Buy/no-buy recommendations from agent metrics
//!
//! `recommend` is pure; where the metrics come from is up to a
//! [`MetricsProvider`].

mod provider;

use serde::{Deserialize, Deserializer};

pub use provider::{
    BackendMetrics, MetricsProvider, PageMetrics, StatCard, labels, parse_display_number,
    parse_stat_card,
};

/// Signals that must fire for a buy recommendation
const BUY_THRESHOLD: usize = 3;

/// Numeric metrics of one agent
///
/// Absent and `null` fields are zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentMetrics {
    #[serde(deserialize_with = "zero_if_null")]
    pub mindshare: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub mindshare_delta_percent: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub market_cap: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub market_cap_delta_percent: f64,
    #[serde(rename = "volume24Hours", deserialize_with = "zero_if_null")]
    pub volume_24_hours: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub holders_count: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub holders_count_delta_percent: f64,
    #[serde(deserialize_with = "zero_if_null")]
    pub liquidity: f64,
}

fn zero_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of scoring an agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    /// Whether buying is recommended
    pub decision: bool,
    /// Sentence explaining the decision
    pub explanation: String,
}

impl Recommendation {
    /// Text spoken to the user
    #[must_use]
    pub fn spoken(&self) -> String {
        if self.decision {
            format!("I recommend buying. {}", self.explanation)
        } else {
            format!("I would not buy right now. {}", self.explanation)
        }
    }
}

/// One scoring rule: the phrase when it holds, the unmet criterion otherwise
struct Signal {
    fired: bool,
    met: &'static str,
    unmet: &'static str,
}

fn signals(m: &AgentMetrics) -> [Signal; 4] {
    [
        Signal {
            fired: m.mindshare_delta_percent > 0.0,
            met: "mindshare is trending up",
            unmet: "mindshare is not growing",
        },
        Signal {
            fired: m.market_cap_delta_percent > -50.0 && m.volume_24_hours > m.market_cap * 0.01,
            met: "trading volume is healthy relative to market cap",
            unmet: "trading volume is weak or market cap is collapsing",
        },
        Signal {
            fired: m.holders_count_delta_percent > 0.0,
            met: "the holder count is growing",
            unmet: "the holder count is not growing",
        },
        Signal {
            fired: m.liquidity > m.market_cap * 0.02,
            met: "liquidity is sufficient",
            unmet: "liquidity is thin",
        },
    ]
}

/// Score metrics into a recommendation
///
/// Buying is recommended when at least three of the four signals fire:
/// growing mindshare, healthy volume without a market cap collapse, growing
/// holders and liquidity above 2% of market cap.
#[must_use]
pub fn recommend(metrics: &AgentMetrics) -> Recommendation {
    let signals = signals(metrics);
    let fired: Vec<&str> = signals.iter().filter(|s| s.fired).map(|s| s.met).collect();
    let decision = fired.len() >= BUY_THRESHOLD;

    let explanation = if decision {
        format!("{}.", capitalize(&join_natural(&fired)))
    } else {
        let unmet: Vec<&str> = signals
            .iter()
            .filter(|s| !s.fired)
            .map(|s| s.unmet)
            .filter(|s| !s.trim().is_empty())
            .collect();
        format!("Concerns: {}.", unmet.join(", "))
    };

    Recommendation {
        decision,
        explanation,
    }
}

/// "a", "a and b", "a, b, and c"
fn join_natural(parts: &[&str]) -> String {
    match parts {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
