//! Transcript classification
//!
//! Maps a wake-word-qualified transcript to the intents it triggers.
//! Classification is ordered phrase matching: the first matching phrase set
//! in the main chain decides the intent. The buy recommendation check sits
//! outside that chain, so a transcript can trigger both a main intent and a
//! recommendation (e.g. "check this agent, should I buy it?").

pub mod extract;

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

pub use extract::{DEFAULT_SWAP_AMOUNT, SearchTerms};

use crate::config::DEFAULT_WAKE_WORD;

/// Classified action for one transcript
///
/// `None` parameters are unspecified in the transcript; the executor prompts
/// for them instead of guessing.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Look up the agent behind the open chart or profile tab
    CheckAgent,
    /// Compare the open profile with another user
    CompareAgent { username: Option<String> },
    /// Show market trend charts for the open profile
    ShowTrends,
    /// Set a price alert for the open profile
    SetPriceAlert { price: Option<f64> },
    /// Export the open profile's data as CSV
    ExportData,
    /// Open the top agents ranking
    ShowTopAgents,
    /// Search tweets, optionally within a date range
    SearchTweets {
        query: Option<String>,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    },
    /// Open the AI analysis view
    ShowAiAnalysis,
    /// Swap SEI for the token on the open chart
    SwapToken { amount: f64 },
    /// Score the open agent's metrics into a buy/no-buy answer
    BuyRecommendation,
    /// Nothing recognised; a no-op
    Unrecognized,
}

impl Intent {
    /// Short name used in logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CheckAgent => "check_agent",
            Self::CompareAgent { .. } => "compare_agent",
            Self::ShowTrends => "show_trends",
            Self::SetPriceAlert { .. } => "set_price_alert",
            Self::ExportData => "export_data",
            Self::ShowTopAgents => "show_top_agents",
            Self::SearchTweets { .. } => "search_tweets",
            Self::ShowAiAnalysis => "show_ai_analysis",
            Self::SwapToken { .. } => "swap_token",
            Self::BuyRecommendation => "buy_recommendation",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Kinds of intent in the main chain, in evaluation order
#[derive(Debug, Clone, Copy)]
enum Kind {
    Compare,
    Trends,
    PriceAlert,
    Export,
    TopAgents,
    Search,
    AiAnalysis,
    Swap,
    Check,
}

/// Ordered main chain: the first kind with a matching phrase wins
const CHAIN: [(Kind, &[&str]); 9] = [
    (Kind::Compare, &["compare with"]),
    (Kind::Trends, &["show trends", "show market trends"]),
    (Kind::PriceAlert, &["set price alert", "set a price alert"]),
    (Kind::Export, &["export data", "export agent data"]),
    (
        Kind::TopAgents,
        &["show top agents", "show trending agents", "show agent rankings"],
    ),
    (Kind::Search, &["search tweets"]),
    (
        Kind::AiAnalysis,
        &["show ai analysis", "show analysis", "ai analysis"],
    ),
    (Kind::Swap, &["swap token", "swap tokens", "swap sei"]),
    (Kind::Check, &["check this agent", "check agent", "look up this agent"]),
];

/// Phrases that ask for a buy recommendation, checked independently
const RECOMMENDATION_PHRASES: &[&str] = &[
    "buy recommendation",
    "should i buy",
    "should i invest",
    "is this a good buy",
    "is it a good buy",
    "worth buying",
];

/// Collapses punctuation and repeated whitespace for phrase matching
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}@]+").expect("valid regex"));

/// Primary intent of a transcript
///
/// Uses the default wake word; see [`parse_all_with_wake_word`] for
/// configurable wake words.
#[must_use]
pub fn parse(transcript: &str) -> Intent {
    parse_all(transcript)
        .into_iter()
        .next()
        .unwrap_or(Intent::Unrecognized)
}

/// Every intent a transcript triggers, in execution order
#[must_use]
pub fn parse_all(transcript: &str) -> Vec<Intent> {
    parse_all_with_wake_word(transcript, DEFAULT_WAKE_WORD)
}

/// Every intent a transcript triggers, stripping `wake_word` from free text
///
/// The main-chain intent (if any) comes first, followed by a buy
/// recommendation when one was asked for. Never empty: an unrecognised
/// transcript yields `[Intent::Unrecognized]`.
#[must_use]
pub fn parse_all_with_wake_word(transcript: &str, wake_word: &str) -> Vec<Intent> {
    let normalized = normalize(transcript);
    let mut intents = Vec::new();

    if let Some(kind) = CHAIN
        .iter()
        .find(|(_, phrases)| contains_any(&normalized, phrases))
        .map(|(kind, _)| *kind)
    {
        intents.push(build(kind, transcript, wake_word));
    }

    if contains_any(&normalized, RECOMMENDATION_PHRASES) {
        intents.push(Intent::BuyRecommendation);
    }

    if intents.is_empty() {
        tracing::debug!(transcript, "no intent matched");
        intents.push(Intent::Unrecognized);
    }

    intents
}

fn build(kind: Kind, transcript: &str, wake_word: &str) -> Intent {
    match kind {
        Kind::Compare => Intent::CompareAgent {
            username: extract::compare_username(transcript),
        },
        Kind::Trends => Intent::ShowTrends,
        Kind::PriceAlert => Intent::SetPriceAlert {
            price: extract::price(transcript),
        },
        Kind::Export => Intent::ExportData,
        Kind::TopAgents => Intent::ShowTopAgents,
        Kind::Search => {
            let terms = extract::search_terms(transcript, wake_word);
            Intent::SearchTweets {
                query: terms.query,
                from_date: terms.from_date,
                to_date: terms.to_date,
            }
        }
        Kind::AiAnalysis => Intent::ShowAiAnalysis,
        Kind::Swap => Intent::SwapToken {
            amount: extract::swap_amount(transcript),
        },
        Kind::Check => Intent::CheckAgent,
    }
}

/// Lowercase, punctuation-free form padded with spaces at both ends
fn normalize(transcript: &str) -> String {
    let lowered = transcript.to_lowercase();
    let spaced = NON_WORD.replace_all(&lowered, " ");
    format!(" {} ", spaced.trim())
}

/// Whole-phrase membership: a phrase matches only on word boundaries
fn contains_any(normalized: &str, phrases: &[&str]) -> bool {
    phrases
        .iter()
        .any(|phrase| normalized.contains(&format!(" {phrase} ")))
}
