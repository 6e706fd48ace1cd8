//! Chrome `DevTools` Protocol browser context
//!
//! Attaches to a Chrome instance started with `--remote-debugging-port` and
//! drives its tabs through `chromiumoxide`.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::{BrowserContext, ElementState, TabHandle};
use crate::{Error, Result};

/// Interval between element checks while waiting
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How long to wait for the debugger endpoint during bootstrap
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `"focused"` for the tab with input focus, else the visibility state
const VISIBILITY_SCRIPT: &str =
    "document.hasFocus() ? 'focused' : document.visibilityState";

#[derive(serde::Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// Browser context backed by a remote Chrome session
pub struct CdpBrowser {
    browser: Mutex<Browser>,
    /// Known tabs, oldest first; tabs opened by us are appended
    order: Mutex<Vec<TabHandle>>,
    focused: Mutex<Option<TabHandle>>,
    handler: JoinHandle<()>,
}

impl CdpBrowser {
    /// Attach to Chrome's remote debugging endpoint (e.g. "127.0.0.1:9222")
    ///
    /// # Errors
    ///
    /// Returns error if the debugger endpoint is unreachable or the session
    /// cannot be established
    pub async fn connect(debugger_address: &str) -> Result<Self> {
        let version_url = format!("http://{debugger_address}/json/version");
        tracing::info!(address = debugger_address, "connecting to Chrome");

        let client = reqwest::Client::builder()
            .timeout(CONNECT_TIMEOUT)
            .build()?;
        let info: VersionInfo = client
            .get(&version_url)
            .send()
            .await
            .map_err(|e| {
                Error::Connectivity(format!(
                    "could not reach Chrome at {debugger_address} ({e}); start it with \
                     --remote-debugging-port=9222"
                ))
            })?
            .json()
            .await?;

        let (browser, mut handler) = Browser::connect(info.web_socket_debugger_url)
            .await
            .map_err(|e| Error::Browser(format!("Connect failed: {e}")))?;

        // Spawn handler in background
        let handler = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        let cdp = Self {
            browser: Mutex::new(browser),
            order: Mutex::new(Vec::new()),
            focused: Mutex::new(None),
            handler,
        };

        let tabs = cdp.tab_handles().await?;
        let current = cdp.active_url().await.unwrap_or_default();
        tracing::info!(tabs = tabs.len(), url = current, "connected to Chrome");

        Ok(cdp)
    }

    /// All page targets currently known to the browser
    async fn pages(&self) -> Result<Vec<Page>> {
        let mut browser = self.browser.lock().await;
        browser
            .fetch_targets()
            .await
            .map_err(|e| Error::Browser(format!("Get targets failed: {e}")))?;
        browser
            .pages()
            .await
            .map_err(|e| Error::Browser(format!("Get pages failed: {e}")))
    }

    async fn page(&self, tab: &TabHandle) -> Result<Page> {
        self.pages()
            .await?
            .into_iter()
            .find(|p| p.target_id().inner() == &tab.0)
            .ok_or_else(|| Error::Browser(format!("tab {tab} is gone")))
    }

    /// The focused page, falling back to the first tab
    async fn focused_page(&self) -> Result<Page> {
        let focused = self.focused.lock().await.clone();
        if let Some(tab) = focused {
            if let Ok(page) = self.page(&tab).await {
                return Ok(page);
            }
        }

        self.pages()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Browser("No active page".to_string()))
    }

    async fn evaluate_bool(&self, script: &str) -> Result<bool> {
        evaluate(&self.focused_page().await?, script).await
    }

    async fn find(&self, selector: &str) -> Result<Element> {
        find_on(&self.focused_page().await?, selector).await
    }

    /// The page the user sees: the one with input focus, else the first
    /// visible one, else the page we focused last
    async fn visible_page(&self) -> Result<Page> {
        let mut visible = None;
        for page in self.pages().await? {
            match evaluate::<String>(&page, VISIBILITY_SCRIPT).await {
                Ok(state) if state == "focused" => return Ok(page),
                Ok(state) if state == "visible" && visible.is_none() => visible = Some(page),
                Ok(_) => {}
                Err(e) => tracing::trace!(error = %e, "visibility check failed"),
            }
        }

        match visible {
            Some(page) => Ok(page),
            None => self.focused_page().await,
        }
    }
}

async fn evaluate<T: DeserializeOwned>(page: &Page, script: &str) -> Result<T> {
    page.evaluate(script)
        .await
        .map_err(|e| Error::Browser(format!("JS execution failed: {e}")))?
        .into_value()
        .map_err(|e| Error::Browser(format!("JS result parse failed: {e}")))
}

async fn find_on(page: &Page, selector: &str) -> Result<Element> {
    page.find_element(selector)
        .await
        .map_err(|e| Error::Ui(format!("Element {selector} not found: {e}")))
}

async fn page_url(page: &Page) -> Result<String> {
    page.url()
        .await
        .map_err(|e| Error::Browser(format!("Get URL failed: {e}")))?
        .ok_or_else(|| Error::Browser("tab has no URL".to_string()))
}

#[async_trait]
impl BrowserContext for CdpBrowser {
    async fn tab_handles(&self) -> Result<Vec<TabHandle>> {
        let live: Vec<TabHandle> = self
            .pages()
            .await?
            .iter()
            .map(|p| TabHandle(p.target_id().inner().clone()))
            .collect();

        let mut order = self.order.lock().await;
        order.retain(|h| live.contains(h));
        for handle in live {
            if !order.contains(&handle) {
                order.push(handle);
            }
        }
        Ok(order.clone())
    }

    async fn tab_url(&self, tab: &TabHandle) -> Result<String> {
        page_url(&self.page(tab).await?).await
    }

    async fn active_url(&self) -> Result<String> {
        page_url(&self.visible_page().await?).await
    }

    async fn open_tab(&self, url: &str) -> Result<()> {
        let page = self
            .browser
            .lock()
            .await
            .new_page(url)
            .await
            .map_err(|e| Error::Browser(format!("New page failed: {e}")))?;

        let handle = TabHandle(page.target_id().inner().clone());
        tracing::debug!(tab = %handle, url, "opened tab");

        let mut order = self.order.lock().await;
        order.retain(|h| h != &handle);
        order.push(handle);
        Ok(())
    }

    async fn focus(&self, tab: &TabHandle) -> Result<()> {
        let page = self.page(tab).await?;
        page.bring_to_front()
            .await
            .map_err(|e| Error::Browser(format!("Focus failed: {e}")))?;
        *self.focused.lock().await = Some(tab.clone());
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        state: ElementState,
        timeout: Duration,
    ) -> Result<()> {
        let script = element_check_script(selector, state)?;

        let polled = tokio::time::timeout(timeout, async {
            loop {
                match self.evaluate_bool(&script).await {
                    Ok(true) => return,
                    Ok(false) => {}
                    Err(e) => tracing::trace!(selector, error = %e, "element check failed"),
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await;

        polled.map_err(|_| {
            Error::Ui(format!(
                "{selector} not {state:?} after {}s",
                timeout.as_secs_f32()
            ))
        })
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.find(selector)
            .await?
            .click()
            .await
            .map_err(|e| Error::Ui(format!("Click on {selector} failed: {e}")))?;
        Ok(())
    }

    async fn submit_with_dialog(
        &self,
        selector: &str,
        text: &str,
        timeout: Duration,
    ) -> Result<String> {
        let page = self.focused_page().await?;
        // Subscribe before submitting; the dialog opens during the key press
        let mut dialogs = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| Error::Browser(format!("Dialog listener failed: {e}")))?;

        let element = find_on(&page, selector).await?;
        element
            .click()
            .await
            .map_err(|e| Error::Ui(format!("Focus failed: {e}")))?;
        element
            .type_str(text)
            .await
            .map_err(|e| Error::Ui(format!("Type failed: {e}")))?;

        // A pending dialog holds up the key press, so both run together
        let accept = async {
            let opened = dialogs
                .next()
                .await
                .ok_or_else(|| Error::Browser("dialog listener closed".to_string()))?;
            page.execute(HandleJavaScriptDialogParams::new(true))
                .await
                .map_err(|e| Error::Browser(format!("Accept dialog failed: {e}")))?;
            Ok::<_, Error>(opened.message.clone())
        };
        let (pressed, accepted) = tokio::join!(
            element.press_key("Enter"),
            tokio::time::timeout(timeout, accept)
        );

        pressed.map_err(|e| Error::Ui(format!("Submit failed: {e}")))?;
        let message = accepted.map_err(|_| {
            Error::Ui(format!(
                "no dialog after submitting {selector} within {}s",
                timeout.as_secs_f32()
            ))
        })??;
        tracing::debug!(selector, message, "accepted dialog");
        Ok(message)
    }

    async fn read_labelled(&self, label: &str) -> Result<String> {
        let script = labelled_block_script(label)?;
        evaluate::<Option<String>>(&self.visible_page().await?, &script)
            .await?
            .ok_or_else(|| Error::Ui(format!("nothing captioned '{label}'")))
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.find(selector)
            .await?
            .scroll_into_view()
            .await
            .map_err(|e| Error::Ui(format!("Scroll to {selector} failed: {e}")))?;
        Ok(())
    }

    async fn script_click(&self, selector: &str) -> Result<()> {
        let quoted = serde_json::to_string(selector)?;
        let script = format!(
            "(() => {{ const el = document.querySelector({quoted}); if (!el) return false; \
             el.scrollIntoView({{block: 'center'}}); el.click(); return true; }})()"
        );

        if self.evaluate_bool(&script).await? {
            Ok(())
        } else {
            Err(Error::Ui(format!("Element {selector} not found")))
        }
    }
}

impl Drop for CdpBrowser {
    fn drop(&mut self) {
        // The remote Chrome keeps running; only our event loop stops
        self.handler.abort();
    }
}

/// JS expression yielding the text of the block captioned `label`, or null
fn labelled_block_script(label: &str) -> Result<String> {
    let quoted = serde_json::to_string(label)?;
    Ok(format!(
        "(() => {{ const label = {quoted}; \
         const caption = [...document.querySelectorAll('body *')].find(el => \
           el.textContent.trim() === label && \
           ![...el.children].some(c => c.textContent.trim() === label)); \
         return caption && caption.parentElement ? caption.parentElement.innerText : null; }})()"
    ))
}

/// JS expression that is `true` once the element satisfies `state`
fn element_check_script(selector: &str, state: ElementState) -> Result<String> {
    let quoted = serde_json::to_string(selector)?;
    let condition = match state {
        ElementState::Present => "true",
        ElementState::Visible => "(el.offsetWidth > 0 || el.offsetHeight > 0 || el.getClientRects().length > 0)",
        ElementState::Clickable => {
            "(el.offsetWidth > 0 || el.offsetHeight > 0 || el.getClientRects().length > 0) \
             && !el.disabled && getComputedStyle(el).pointerEvents !== 'none'"
        }
    };

    Ok(format!(
        "(() => {{ const el = document.querySelector({quoted}); return !!el && {condition}; }})()"
    ))
}
