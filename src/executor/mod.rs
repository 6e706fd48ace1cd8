//! Intent execution
//!
//! Each intent runs as a chain of steps against the browser and the
//! backend: resolve the context from the open tabs, check the backend is up,
//! open a frontend page, let it settle, then wait for and act on one element
//! at a time. A failure anywhere in the chain ends the intent with a single
//! spoken message; nothing is retried.

pub mod frontend;

use std::time::Duration;

use crate::advisor::{self, MetricsProvider, labels};
use crate::browser::{self, BrowserContext, ElementState};
use crate::command::Intent;
use crate::config::Timing;
use crate::integrations::{BackendClient, SwapClient, SwapRequest, Tweet};
use crate::links::{self, AgentContext};
use crate::voice::Speaker;
use crate::{Error, Result};

/// Spoken when an intent needs a profile tab and none is open
pub const NO_PROFILE_PROMPT: &str =
    "Please open Twitter and navigate to a profile, then try again.";

/// Spoken when neither a token chart nor a profile tab is open
pub const NO_AGENT_PROMPT: &str =
    "Please open a token chart or navigate to a Twitter profile, then try again.";

const PRICE_PROMPT: &str =
    "Please say the price for the alert, for example: cookie set price alert for 12.5.";

const COMPARE_PROMPT: &str =
    "Please say who to compare with, for example: cookie compare with @username.";

const SEARCH_PROMPT: &str =
    "What should I search for? For example: cookie search tweets for AI agents.";

/// Search results read aloud
const SPOKEN_TWEETS: usize = 3;

/// Runs intents against the session's collaborators
///
/// Borrowed from the session for the duration of one transcript.
pub struct IntentExecutor<'a> {
    pub browser: &'a dyn BrowserContext,
    pub backend: &'a BackendClient,
    pub swap: &'a SwapClient,
    pub speaker: &'a dyn Speaker,
    pub metrics: &'a dyn MetricsProvider,
    /// Frontend base URL
    pub frontend: &'a str,
    pub timing: &'a Timing,
}

impl IntentExecutor<'_> {
    /// Execute one intent
    ///
    /// Never fails: errors are logged and turned into one spoken message.
    pub async fn execute(&self, intent: &Intent) {
        tracing::info!(intent = intent.name(), "executing intent");

        if let Err(e) = self.run(intent).await {
            tracing::warn!(intent = intent.name(), error = %e, "intent failed");
            self.speaker.speak(&e.spoken_message()).await;
        }
    }

    async fn run(&self, intent: &Intent) -> Result<()> {
        match intent {
            Intent::CheckAgent => self.check_agent().await,
            Intent::CompareAgent { username } => self.compare(username.as_deref()).await,
            Intent::ShowTrends => self.show_trends().await,
            Intent::SetPriceAlert { price } => self.set_price_alert(*price).await,
            Intent::ExportData => self.export_data().await,
            Intent::ShowTopAgents => self.show_top_agents().await,
            Intent::SearchTweets {
                query,
                from_date,
                to_date,
            } => {
                let query = query
                    .as_deref()
                    .ok_or_else(|| Error::MissingParameter(SEARCH_PROMPT.to_string()))?;
                self.search_tweets(query, *from_date, *to_date).await
            }
            Intent::ShowAiAnalysis => self.show_ai_analysis().await,
            Intent::SwapToken { amount } => self.swap_token(*amount).await,
            Intent::BuyRecommendation => self.buy_recommendation().await,
            Intent::Unrecognized => {
                tracing::debug!("nothing to execute");
                Ok(())
            }
        }
    }

    async fn check_agent(&self) -> Result<()> {
        let tabs = browser::snapshot(self.browser).await?;

        match links::resolve_agent(&tabs) {
            Some(AgentContext::Contract(address)) => {
                self.say(&format!(
                    "Looking up the agent for contract {}",
                    spoken_address(&address)
                ))
                .await;
                self.preflight().await?;
                self.open(&frontend::contract_search_url(self.frontend, &address)?)
                    .await?;
                self.wait(frontend::CONTRACT_SEARCH_RADIO, ElementState::Clickable)
                    .await?;
                self.browser.click(frontend::CONTRACT_SEARCH_RADIO).await?;
                self.wait_label(labels::MINDSHARE).await?;
                self.say("Here is the agent behind this token.").await;
            }
            Some(AgentContext::Username(username)) => {
                self.say(&format!("Looking up agent {username}")).await;
                self.preflight().await?;
                self.open(&frontend::search_url(self.frontend, &username)?)
                    .await?;
                self.say(&format!("Searching for {username}")).await;
            }
            None => return Err(Error::Resolution(NO_AGENT_PROMPT.to_string())),
        }

        Ok(())
    }

    async fn compare(&self, other: Option<&str>) -> Result<()> {
        let other = other.ok_or_else(|| Error::MissingParameter(COMPARE_PROMPT.to_string()))?;
        let current = self.current_username().await?;

        self.say(&format!("Comparing {current} with {other}")).await;
        self.preflight().await?;
        self.open(&frontend::compare_url(self.frontend, &current, other)?)
            .await?;
        self.wait_label(labels::MINDSHARE).await?;
        self.say("Here is the comparison.").await;
        Ok(())
    }

    async fn show_trends(&self) -> Result<()> {
        let username = self.current_username().await?;

        self.preflight().await?;
        self.open(&frontend::search_url(self.frontend, &username)?)
            .await?;
        self.wait(frontend::TRENDS_SECTION, ElementState::Present)
            .await?;
        self.browser
            .scroll_into_view(frontend::TRENDS_SECTION)
            .await?;
        self.say(&format!("Here are the market trends for {username}"))
            .await;
        Ok(())
    }

    async fn set_price_alert(&self, price: Option<f64>) -> Result<()> {
        let price = price.ok_or_else(|| Error::MissingParameter(PRICE_PROMPT.to_string()))?;
        let username = self.current_username().await?;

        self.preflight().await?;
        self.open(&frontend::search_url(self.frontend, &username)?)
            .await?;
        self.wait(frontend::PRICE_ALERT_INPUT, ElementState::Clickable)
            .await?;
        let confirmation = self
            .browser
            .submit_with_dialog(
                frontend::PRICE_ALERT_INPUT,
                &price.to_string(),
                self.timing.element_timeout,
            )
            .await?;
        tracing::debug!(confirmation, "price alert confirmed");
        self.say(&format!("Price alert set for {username} at {price}"))
            .await;
        Ok(())
    }

    async fn export_data(&self) -> Result<()> {
        let username = self.current_username().await?;

        self.preflight().await?;
        self.open(&frontend::search_url(self.frontend, &username)?)
            .await?;
        self.wait(frontend::EXPORT_BUTTON, ElementState::Present)
            .await?;
        self.browser.script_click(frontend::EXPORT_BUTTON).await?;
        self.say(&format!("Exporting data for {username}")).await;
        Ok(())
    }

    async fn show_top_agents(&self) -> Result<()> {
        self.preflight().await?;
        self.open(&frontend::top_agents_url(self.frontend)?).await?;
        self.wait(frontend::AGENTS_LIST, ElementState::Visible)
            .await?;
        self.say("Here are the top agents.").await;
        Ok(())
    }

    async fn show_ai_analysis(&self) -> Result<()> {
        self.open(&frontend::ai_analysis_url(self.frontend)?).await?;
        self.wait_label(frontend::AI_ANALYSIS_HEADING).await?;
        self.say("Here is the AI analysis.").await;
        Ok(())
    }

    async fn search_tweets(
        &self,
        query: &str,
        from: Option<chrono::NaiveDate>,
        to: Option<chrono::NaiveDate>,
    ) -> Result<()> {
        self.preflight().await?;
        self.say(&format!("Searching tweets for {query}")).await;

        let tweets = self.backend.search(query, from, to).await?;
        if tweets.is_empty() {
            self.say(&format!("No tweets found for {query}")).await;
            return Ok(());
        }

        tracing::debug!(query, count = tweets.len(), "tweets found");
        self.say(&format!(
            "Found {} tweets. Here are the top results.",
            tweets.len()
        ))
        .await;
        for tweet in tweets.iter().take(SPOKEN_TWEETS) {
            self.say(&describe_tweet(tweet)).await;
        }
        Ok(())
    }

    async fn swap_token(&self, amount: f64) -> Result<()> {
        let chart_url = self.chart_url().await?;

        self.say(&format!("Swapping {amount} SEI")).await;
        let receipt = self
            .swap
            .swap(&SwapRequest {
                dex_screener_url: chart_url,
                amount_sei: amount,
            })
            .await?;

        self.say(&format!(
            "Swap successful. Transaction hash: {}",
            receipt.tx_hash
        ))
        .await;
        Ok(())
    }

    async fn buy_recommendation(&self) -> Result<()> {
        let metrics = self.metrics.metrics(self.browser).await?;
        let recommendation = advisor::recommend(&metrics);

        tracing::info!(
            decision = recommendation.decision,
            explanation = recommendation.explanation,
            "recommendation"
        );
        self.say(&recommendation.spoken()).await;
        Ok(())
    }

    /// Username of the first profile tab
    async fn current_username(&self) -> Result<String> {
        let tabs = browser::snapshot(self.browser).await?;
        links::find_username(&tabs).ok_or_else(|| Error::Resolution(NO_PROFILE_PROMPT.to_string()))
    }

    /// Chart to swap on: the tab in view when it is a chart, else the first
    /// chart tab, else whatever is in view for the swap service to judge
    async fn chart_url(&self) -> Result<String> {
        let active = self.browser.active_url().await?;
        if links::contract_from_url(&active).is_some() {
            return Ok(active);
        }

        let tabs = browser::snapshot(self.browser).await?;
        Ok(links::find_chart_url(&tabs).unwrap_or_else(|| {
            tracing::debug!(url = active, "no chart tab open");
            active
        }))
    }

    /// Backend liveness check issued before any navigation
    async fn preflight(&self) -> Result<()> {
        self.backend.health(self.timing.health_timeout).await
    }

    /// Open a page, let it settle and focus it
    async fn open(&self, url: &str) -> Result<()> {
        tracing::debug!(url, "opening tab");
        self.browser.open_tab(url).await?;
        settle(self.timing.settle).await;
        browser::focus_latest(self.browser).await
    }

    async fn wait(&self, selector: &str, state: ElementState) -> Result<()> {
        self.browser
            .wait_for(selector, state, self.timing.element_timeout)
            .await
    }

    async fn wait_label(&self, label: &str) -> Result<()> {
        browser::wait_for_label(self.browser, label, self.timing.element_timeout).await?;
        Ok(())
    }

    async fn say(&self, text: &str) {
        self.speaker.speak(text).await;
    }
}

async fn settle(grace: Duration) {
    if !grace.is_zero() {
        tokio::time::sleep(grace).await;
    }
}

/// Long addresses are read as their first six and last four characters
fn spoken_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

fn describe_tweet(tweet: &Tweet) -> String {
    let author = if tweet.author_username.is_empty() {
        "Someone"
    } else {
        tweet.author_username.as_str()
    };
    format!("{author} says: {}", tweet.text.trim())
}
