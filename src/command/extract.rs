//! Parameter extraction from transcripts

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Swap amount used when the transcript names none
pub const DEFAULT_SWAP_AMOUNT: f64 = 1.0;

static PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)alert (?:for|at) \$?(\d+(?:\.\d+)?)").expect("valid regex")
});

static COMPARE_USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)compare with @(.*)$").expect("valid regex"));

static SWAP_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*sei\b").expect("valid regex"));

static SEARCH_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsearch tweets(?: for)?\b").expect("valid regex"));

/// `from <date>` / `to <date>` with an ISO or spoken date
static DATE_BOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(from|since|to|until)\s+(\d{4}-\d{2}-\d{2}|[a-z]+\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4})\b",
    )
    .expect("valid regex")
});

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d)(?:st|nd|rd|th)\b").expect("valid regex"));

/// Free-text search with its optional date range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms {
    pub query: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// Price after `alert for` / `alert at`
#[must_use]
pub fn price(transcript: &str) -> Option<f64> {
    PRICE
        .captures(transcript)
        .and_then(|caps| caps[1].parse().ok())
}

/// Username after the `compare with @` marker
#[must_use]
pub fn compare_username(transcript: &str) -> Option<String> {
    let caps = COMPARE_USERNAME.captures(transcript)?;
    let username = caps[1].trim().trim_end_matches(['.', '?', '!']);
    (!username.is_empty()).then(|| username.to_string())
}

/// Amount in SEI, defaulting to one
#[must_use]
pub fn swap_amount(transcript: &str) -> f64 {
    SWAP_AMOUNT
        .captures(transcript)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(DEFAULT_SWAP_AMOUNT)
}

/// Query text and date range of a tweet search
///
/// The wake word, the `search tweets [for]` phrase and any date bounds are
/// removed from the query.
#[must_use]
pub fn search_terms(transcript: &str, wake_word: &str) -> SearchTerms {
    let mut from_date = None;
    let mut to_date = None;

    for caps in DATE_BOUND.captures_iter(transcript) {
        let Some(date) = parse_date(&caps[2]) else {
            continue;
        };
        match caps[1].to_lowercase().as_str() {
            "from" | "since" => from_date = from_date.or(Some(date)),
            _ => to_date = to_date.or(Some(date)),
        }
    }

    let without_dates = DATE_BOUND.replace_all(transcript, |caps: &regex::Captures<'_>| {
        if parse_date(&caps[2]).is_some() {
            String::new()
        } else {
            caps[0].to_string()
        }
    });
    let without_prefix = SEARCH_PREFIX.replace(&without_dates, "");
    let query = strip_word(&without_prefix, wake_word);
    let query = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_ascii_punctuation() && c != '$' && c != '#' && c != '@')
        .trim()
        .to_string();

    SearchTerms {
        query: (!query.is_empty()).then_some(query),
        from_date,
        to_date,
    }
}

/// Remove every case-insensitive occurrence of `word` from `text`
fn strip_word(text: &str, word: &str) -> String {
    if word.is_empty() {
        return text.to_string();
    }
    let pattern = format!(r"(?i)\b{}\b,?", regex::escape(word));
    Regex::new(&pattern).map_or_else(
        |_| text.to_string(),
        |re| re.replace_all(text, "").into_owned(),
    )
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = ORDINAL_SUFFIX.replace_all(raw.trim(), "$1").replace(',', "");
    NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&cleaned, "%B %d %Y"))
        .or_else(|_| NaiveDate::parse_from_str(&cleaned, "%b %d %Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_integer_and_decimal() {
        assert_eq!(price("cookie set price alert for 12.5"), Some(12.5));
        assert_eq!(price("cookie set price alert at 3"), Some(3.0));
        assert_eq!(price("cookie set price alert for $0.75"), Some(0.75));
        assert_eq!(price("cookie set price alert"), None);
    }

    #[test]
    fn test_compare_username() {
        assert_eq!(
            compare_username("cookie compare with @alice").as_deref(),
            Some("alice")
        );
        assert_eq!(
            compare_username("Cookie Compare With @Alice.").as_deref(),
            Some("Alice")
        );
        assert_eq!(compare_username("cookie compare with @   "), None);
        assert_eq!(compare_username("cookie compare with alice"), None);
    }

    #[test]
    fn test_swap_amount_default() {
        assert!((swap_amount("cookie swap token") - 1.0).abs() < f64::EPSILON);
        assert!((swap_amount("cookie swap token 3.5 sei") - 3.5).abs() < f64::EPSILON);
        assert!((swap_amount("cookie swap 2 SEI") - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_search_query_strips_phrases() {
        let terms = search_terms("cookie search tweets for solana agents", "cookie");
        assert_eq!(terms.query.as_deref(), Some("solana agents"));
        assert_eq!(terms.from_date, None);

        let terms = search_terms("Cookie, search tweets AI16Z", "cookie");
        assert_eq!(terms.query.as_deref(), Some("AI16Z"));
    }

    #[test]
    fn test_search_query_empty() {
        let terms = search_terms("cookie search tweets for", "cookie");
        assert_eq!(terms.query, None);
    }

    #[test]
    fn test_search_date_range() {
        let terms = search_terms(
            "cookie search tweets for eliza from 2025-01-01 to January 31st, 2025",
            "cookie",
        );
        assert_eq!(terms.query.as_deref(), Some("eliza"));
        assert_eq!(terms.from_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(terms.to_date, NaiveDate::from_ymd_opt(2025, 1, 31));
    }

    #[test]
    fn test_unparseable_date_stays_in_query() {
        let terms = search_terms("cookie search tweets from someday 2025", "cookie");
        assert_eq!(terms.from_date, None);
        assert!(terms.query.unwrap().contains("someday"));
    }
}
