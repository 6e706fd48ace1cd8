//! Shared test utilities
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cookie_voice::browser::{BrowserContext, ElementState, TabHandle};
use cookie_voice::config::{Config, Timing};
use cookie_voice::voice::Speaker;
use cookie_voice::{Error, Result, Session};

/// Token chart tab used across tests
pub const CHART_URL: &str =
    "https://dexscreener.com/base/0xc0041ef357b183448b235a8ea73ce4e4ec8c265f";
pub const CHART_ADDRESS: &str = "0xc0041ef357b183448b235a8ea73ce4e4ec8c265f";
pub const FRONTEND: &str = "http://localhost:5003";

#[derive(Default)]
struct BrowserState {
    tabs: Vec<String>,
    opened: Vec<String>,
    present: HashSet<String>,
    /// Captioned blocks keyed by page URL and caption
    labels: HashMap<(String, String), String>,
    dialog: Option<String>,
    clicks: Vec<String>,
    submitted: Vec<(String, String)>,
    scrolled: Vec<String>,
    focused: Option<usize>,
    active_url: String,
}

/// In-memory browser
///
/// Elements exist only when registered with `with_element`; waits on anything
/// else fail immediately. Captions belong to one page and are only readable
/// while that page is the active one.
#[derive(Default)]
pub struct MockBrowser {
    state: Mutex<BrowserState>,
}

impl MockBrowser {
    pub fn with_tabs(urls: &[&str]) -> Self {
        let browser = Self::default();
        {
            let mut state = browser.state.lock().unwrap();
            state.tabs = urls.iter().map(ToString::to_string).collect();
            state.active_url = urls.last().map(ToString::to_string).unwrap_or_default();
        }
        browser
    }

    pub fn with_element(self, selector: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .present
            .insert(selector.to_string());
        self
    }

    pub fn with_label(self, url: &str, label: &str, text: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .labels
            .insert((url.to_string(), label.to_string()), text.to_string());
        self
    }

    /// Render the stat cards of a thriving agent on the page at `url`
    pub fn with_agent_details(self, url: &str) -> Self {
        self.with_label(url, "Mindshare", "Mindshare\n4.20\n+12.00%")
            .with_label(url, "Market Cap", "Market Cap\n$1.0M\n-5.00%")
            .with_label(url, "24h Volume", "24h Volume\n$50K")
            .with_label(url, "Holders", "Holders\n2,000\n+3.00%")
            .with_label(url, "Liquidity", "Liquidity\n$40K")
    }

    /// Answer submissions with a JavaScript dialog showing `message`
    pub fn with_dialog(self, message: &str) -> Self {
        self.state.lock().unwrap().dialog = Some(message.to_string());
        self
    }

    pub fn with_active_url(self, url: &str) -> Self {
        self.state.lock().unwrap().active_url = url.to_string();
        self
    }

    /// URLs opened in new tabs, in order
    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    /// Selector and text of each submission that got a dialog back
    pub fn submitted(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn scrolled(&self) -> Vec<String> {
        self.state.lock().unwrap().scrolled.clone()
    }

    pub fn focused(&self) -> Option<usize> {
        self.state.lock().unwrap().focused
    }

    fn require(&self, selector: &str) -> Result<()> {
        if self.state.lock().unwrap().present.contains(selector) {
            Ok(())
        } else {
            Err(Error::Ui(format!("{selector} not found")))
        }
    }
}

fn index_of(tab: &TabHandle) -> Result<usize> {
    tab.0
        .strip_prefix("tab-")
        .and_then(|i| i.parse().ok())
        .ok_or_else(|| Error::Browser(format!("unknown tab {tab}")))
}

#[async_trait]
impl BrowserContext for MockBrowser {
    async fn tab_handles(&self) -> Result<Vec<TabHandle>> {
        let count = self.state.lock().unwrap().tabs.len();
        Ok((0..count).map(|i| TabHandle(format!("tab-{i}"))).collect())
    }

    async fn tab_url(&self, tab: &TabHandle) -> Result<String> {
        let index = index_of(tab)?;
        self.state
            .lock()
            .unwrap()
            .tabs
            .get(index)
            .cloned()
            .ok_or_else(|| Error::Browser(format!("tab {tab} closed")))
    }

    async fn active_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().active_url.clone())
    }

    async fn open_tab(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.tabs.push(url.to_string());
        state.opened.push(url.to_string());
        Ok(())
    }

    async fn focus(&self, tab: &TabHandle) -> Result<()> {
        let index = index_of(tab)?;
        let mut state = self.state.lock().unwrap();
        state.active_url = state.tabs[index].clone();
        state.focused = Some(index);
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _: ElementState, _: Duration) -> Result<()> {
        self.require(selector)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.require(selector)?;
        self.state.lock().unwrap().clicks.push(selector.to_string());
        Ok(())
    }

    async fn submit_with_dialog(&self, selector: &str, text: &str, _: Duration) -> Result<String> {
        self.require(selector)?;
        let mut state = self.state.lock().unwrap();
        let message = state
            .dialog
            .clone()
            .ok_or_else(|| Error::Ui(format!("no dialog after submitting {selector}")))?;
        state
            .submitted
            .push((selector.to_string(), text.to_string()));
        Ok(message)
    }

    async fn read_labelled(&self, label: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .labels
            .get(&(state.active_url.clone(), label.to_string()))
            .cloned()
            .ok_or_else(|| Error::Ui(format!("nothing captioned '{label}'")))
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.require(selector)?;
        self.state.lock().unwrap().scrolled.push(selector.to_string());
        Ok(())
    }

    async fn script_click(&self, selector: &str) -> Result<()> {
        self.click(selector).await
    }
}

/// Speaker that remembers everything it was asked to say
#[derive(Default)]
pub struct RecordingSpeaker {
    lines: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.lines.lock().unwrap().last().cloned()
    }

    pub fn said(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}

/// Serve a router on an ephemeral local port, returning its base URL
pub async fn spawn_fixture(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind fixture server");
    let addr = listener.local_addr().expect("fixture address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    format!("http://{addr}")
}

/// Base URL nothing listens on
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

/// Configuration pointing at test services, with no settle delay
pub fn test_config(api_url: &str, swap_url: &str) -> Config {
    let mut config = Config::default();
    config.endpoints.api_url = api_url.to_string();
    config.endpoints.frontend_url = FRONTEND.to_string();
    config.endpoints.swap_url = swap_url.to_string();
    config.timing = Timing {
        health_timeout: Duration::from_secs(2),
        settle: Duration::ZERO,
        element_timeout: Duration::from_millis(50),
        request_timeout: Duration::from_secs(2),
    };
    config
}

/// Session over a mock browser and recording speaker
pub fn test_session(
    config: Config,
    browser: &Arc<MockBrowser>,
    speaker: &Arc<RecordingSpeaker>,
) -> Session {
    Session::new(config, browser.clone(), speaker.clone())
}
