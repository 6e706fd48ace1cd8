//! Browser context
//!
//! The dispatcher drives an already-running browser: it enumerates tabs,
//! reads their URLs, opens new tabs and waits for and interacts with DOM
//! elements. Elements are found by CSS selector, or by the caption the
//! frontend renders next to a value when it has no id to go by.
//! `BrowserContext` is the seam; `CdpBrowser` is the Chrome `DevTools`
//! Protocol implementation.

mod cdp;

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

pub use cdp::CdpBrowser;

use crate::{Error, Result};

/// Interval between label checks while waiting
const LABEL_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Opaque identifier of a browser tab
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabHandle(pub String);

impl std::fmt::Display for TabHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tab and the URL it showed when the snapshot was taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub handle: TabHandle,
    pub url: String,
}

/// Ordered set of tabs captured at one point in time
///
/// Handles are unique within a snapshot. URLs can be stale by the time they
/// are used: tabs are read one at a time, so the snapshot is not atomic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabSnapshot {
    tabs: Vec<Tab>,
}

impl TabSnapshot {
    /// Build a snapshot, keeping the first occurrence of any repeated handle
    #[must_use]
    pub fn new(tabs: impl IntoIterator<Item = Tab>) -> Self {
        let mut unique: Vec<Tab> = Vec::new();
        for tab in tabs {
            if unique.iter().any(|t| t.handle == tab.handle) {
                continue;
            }
            unique.push(tab);
        }
        Self { tabs: unique }
    }

    /// Build a snapshot from bare URLs, numbering handles in order
    #[must_use]
    pub fn from_urls<S: Into<String>>(urls: impl IntoIterator<Item = S>) -> Self {
        Self::new(urls.into_iter().enumerate().map(|(i, url)| Tab {
            handle: TabHandle(format!("tab-{i}")),
            url: url.into(),
        }))
    }

    /// Tabs in browser order
    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

/// Condition an element wait is satisfied by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// Element exists in the DOM
    Present,
    /// Element is rendered with a non-empty box
    Visible,
    /// Element is visible and not disabled
    Clickable,
}

/// Remote browser operations the executor relies on
///
/// Element operations target the tab focused last; captions are read from
/// the tab the user is looking at.
#[async_trait]
pub trait BrowserContext: Send + Sync {
    /// Handles of all open tabs, in browser order
    async fn tab_handles(&self) -> Result<Vec<TabHandle>>;

    /// Current URL of one tab
    async fn tab_url(&self, tab: &TabHandle) -> Result<String>;

    /// URL of the tab the user is looking at
    async fn active_url(&self) -> Result<String>;

    /// Open a URL in a new tab
    async fn open_tab(&self, url: &str) -> Result<()>;

    /// Move focus to a tab
    async fn focus(&self, tab: &TabHandle) -> Result<()>;

    /// Wait until an element matching `selector` reaches `state`
    async fn wait_for(&self, selector: &str, state: ElementState, timeout: Duration)
    -> Result<()>;

    /// Click an element
    async fn click(&self, selector: &str) -> Result<()>;

    /// Type text into an element, press Enter and accept the JavaScript
    /// dialog the page answers with
    ///
    /// Returns the dialog's message. Fails if no dialog opens within
    /// `timeout`.
    async fn submit_with_dialog(&self, selector: &str, text: &str, timeout: Duration)
    -> Result<String>;

    /// Rendered text of the block captioned `label`
    ///
    /// The block is the parent of the innermost element whose whole text is
    /// `label`, so the result starts with the caption itself.
    async fn read_labelled(&self, label: &str) -> Result<String>;

    /// Scroll an element into view
    async fn scroll_into_view(&self, selector: &str) -> Result<()>;

    /// Scroll an element into view and click it from script
    async fn script_click(&self, selector: &str) -> Result<()>;
}

/// Capture the current tabs and their URLs
///
/// A tab whose URL cannot be read is left out of the snapshot.
///
/// # Errors
///
/// Returns error only if the tab list itself cannot be obtained
pub async fn snapshot(browser: &dyn BrowserContext) -> Result<TabSnapshot> {
    let handles = browser.tab_handles().await?;
    let mut tabs = Vec::with_capacity(handles.len());

    for handle in handles {
        match browser.tab_url(&handle).await {
            Ok(url) => {
                tracing::debug!(tab = %handle, url, "checking tab");
                tabs.push(Tab { handle, url });
            }
            Err(e) => tracing::debug!(tab = %handle, error = %e, "skipping unreadable tab"),
        }
    }

    Ok(TabSnapshot::new(tabs))
}

/// Wait until a block captioned `label` renders, returning its text
///
/// # Errors
///
/// Returns `Error::Ui` if the caption does not appear within `timeout`
pub async fn wait_for_label(
    browser: &dyn BrowserContext,
    label: &str,
    timeout: Duration,
) -> Result<String> {
    let deadline = Instant::now() + timeout;
    loop {
        match browser.read_labelled(label).await {
            Ok(text) => return Ok(text),
            Err(e) if Instant::now() >= deadline => {
                return Err(Error::Ui(format!(
                    "'{label}' not shown after {}s: {e}",
                    timeout.as_secs_f32()
                )));
            }
            Err(e) => tracing::trace!(label, error = %e, "label not rendered yet"),
        }
        tokio::time::sleep(LABEL_POLL_INTERVAL.min(timeout)).await;
    }
}

/// Focus the most recently opened tab (last in handle order)
///
/// # Errors
///
/// Returns error if no tab is open or focus cannot be moved
pub async fn focus_latest(browser: &dyn BrowserContext) -> Result<()> {
    let handles = browser.tab_handles().await?;
    let latest = handles
        .last()
        .ok_or_else(|| Error::Browser("no open tabs".to_string()))?;
    browser.focus(latest).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_keeps_first_duplicate_handle() {
        let snapshot = TabSnapshot::new([
            Tab {
                handle: TabHandle("a".to_string()),
                url: "https://x.com/alice".to_string(),
            },
            Tab {
                handle: TabHandle("a".to_string()),
                url: "https://x.com/bob".to_string(),
            },
            Tab {
                handle: TabHandle("b".to_string()),
                url: "https://example.com".to_string(),
            },
        ]);

        assert_eq!(snapshot.len(), 2);
        let urls: Vec<_> = snapshot.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.com/alice", "https://example.com"]);
    }

    #[test]
    fn test_from_urls_numbers_handles() {
        let snapshot = TabSnapshot::from_urls(["https://a.test", "https://b.test"]);
        let handles: Vec<_> = snapshot.iter().map(|t| t.handle.to_string()).collect();
        assert_eq!(handles, vec!["tab-0", "tab-1"]);
    }
}
