//! Frontend URLs and DOM contract
//!
//! The frontend is driven only through these routes, query parameters,
//! element selectors and visible captions. A reimplemented UI has to keep
//! them. Agent details render without ids; they are found by the stat card
//! captions in [`crate::advisor::labels`].

use url::Url;

use crate::Result;

/// Radio button that switches the search box to contract mode
pub const CONTRACT_SEARCH_RADIO: &str = "#contract-search-radio";
/// Holder of the trend charts on the agent page
pub const TRENDS_SECTION: &str = "#trends-section";
/// Price input; submitting it answers with a JavaScript alert
pub const PRICE_ALERT_INPUT: &str = "#price-alert-input";
pub const EXPORT_BUTTON: &str = "#export-button";
pub const AGENTS_LIST: &str = ".agents-list";

/// Heading of the AI analysis panel, which carries no id
pub const AI_ANALYSIS_HEADING: &str = "AI Market Analysis";

/// Agent search by username: `<base>/?search=<username>`
///
/// # Errors
///
/// Returns error if the base URL is invalid
pub fn search_url(base: &str, username: &str) -> Result<String> {
    with_query(base, "", &[("search", username)])
}

/// Agent search by contract: `<base>/?contractSearch=<address>`
///
/// # Errors
///
/// Returns error if the base URL is invalid
pub fn contract_search_url(base: &str, address: &str) -> Result<String> {
    with_query(base, "", &[("contractSearch", address)])
}

/// Side-by-side comparison: `<base>/?search=<current>&compare=<other>`
///
/// # Errors
///
/// Returns error if the base URL is invalid
pub fn compare_url(base: &str, current: &str, other: &str) -> Result<String> {
    with_query(base, "", &[("search", current), ("compare", other)])
}

/// Top agents ranking page
///
/// # Errors
///
/// Returns error if the base URL is invalid
pub fn top_agents_url(base: &str) -> Result<String> {
    with_query(base, "top-agents", &[])
}

/// AI analysis page
///
/// # Errors
///
/// Returns error if the base URL is invalid
pub fn ai_analysis_url(base: &str) -> Result<String> {
    with_query(base, "ai-analysis", &[])
}

fn with_query(base: &str, path: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(&format!("{}/{path}", base.trim_end_matches('/')))?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url.into())
}
