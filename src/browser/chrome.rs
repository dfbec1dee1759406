use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::config::BrowserConfig;
use super::scroll::{ScrollStep, ScrollTracker};
use super::{BrowserError, Interaction, Launcher, PageHost, PageRequest};

/// Launches a fresh headless Chrome per session
pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        ChromeLauncher { config }
    }
}

impl Launcher for ChromeLauncher {
    fn launch(&self) -> Result<Arc<dyn PageHost>, BrowserError> {
        let owned_args = self.config.chrome_args();
        let args: Vec<&OsStr> = owned_args.iter().map(OsStr::new).collect();

        let options = LaunchOptions::default_builder()
            .headless(self.config.headless)
            .window_size(Some(self.config.window_size))
            .path(self.config.chrome_path.clone())
            .idle_browser_timeout(self.config.idle_timeout)
            .args(args)
            .build()
            .map_err(|e| BrowserError::Configuration(e.to_string()))?;

        let browser =
            Browser::new(options).map_err(|e| BrowserError::Initialization(e.to_string()))?;

        Ok(Arc::new(ChromeHost {
            browser: RwLock::new(Some(browser)),
        }))
    }
}

/// A live Chrome process. Dropping the inner `Browser` kills the process.
pub struct ChromeHost {
    browser: RwLock<Option<Browser>>,
}

impl ChromeHost {
    fn open_tab(&self) -> Result<PageGuard, BrowserError> {
        let guard = self.browser.read().unwrap_or_else(PoisonError::into_inner);
        let browser = guard.as_ref().ok_or(BrowserError::Closed)?;
        let tab = browser
            .new_tab()
            .map_err(|e| BrowserError::TabCreation(e.to_string()))?;
        Ok(PageGuard { tab })
    }
}

impl PageHost for ChromeHost {
    fn render(&self, request: &PageRequest) -> Result<String, BrowserError> {
        let page = self.open_tab()?;
        let tab = &page.tab;
        tab.set_default_timeout(request.timeout);

        tab.navigate_to(&request.url)
            .map_err(|e| BrowserError::Navigation(format!("{}: {}", request.url, e)))?;
        tab.wait_until_navigated()
            .map_err(|e| BrowserError::Navigation(format!("timeout for {}: {}", request.url, e)))?;
        wait_ready(tab, &request.ready_selector, request.timeout)?;

        if let Some(interaction) = &request.interaction {
            apply_interaction(tab, interaction, &request.ready_selector, request.timeout)?;
        }

        if let Some(policy) = request.scroll {
            let mut tracker = ScrollTracker::new(policy);
            loop {
                let height = document_height(tab)?;
                match tracker.observe(height, Instant::now()) {
                    ScrollStep::Continue => {
                        tab.evaluate("window.scrollTo(0, document.body.scrollHeight);", false)
                            .map_err(|e| {
                                BrowserError::JavaScript(format!("scroll failed: {}", e))
                            })?;
                        std::thread::sleep(policy.poll_interval);
                    }
                    ScrollStep::Settled => {
                        debug!(
                            url = %request.url,
                            rounds = tracker.rounds(),
                            "page height settled"
                        );
                        break;
                    }
                    ScrollStep::Exhausted => {
                        warn!(
                            url = %request.url,
                            rounds = tracker.rounds(),
                            "page still growing, scroll budget exhausted"
                        );
                        break;
                    }
                }
            }
        }

        tab.get_content()
            .map_err(|e| BrowserError::HtmlExtraction(e.to_string()))
    }

    fn shutdown(&self) {
        let browser = self
            .browser
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(browser);
    }
}

/// Closes its tab when dropped, whichever way `render` returns.
struct PageGuard {
    tab: Arc<Tab>,
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            debug!("closing page context failed: {}", e);
        }
    }
}

fn wait_ready(tab: &Tab, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
    tab.wait_for_element_with_custom_timeout(selector, timeout)
        .map(|_| ())
        .map_err(|e| BrowserError::Timeout(format!("selector {}: {}", selector, e)))
}

fn apply_interaction(
    tab: &Tab,
    interaction: &Interaction,
    ready_selector: &str,
    timeout: Duration,
) -> Result<(), BrowserError> {
    match interaction {
        Interaction::SelectFilter {
            selector,
            active_class,
        } => {
            let script = select_filter_script(selector, active_class);
            let outcome = tab
                .evaluate(&script, false)
                .map_err(|e| BrowserError::JavaScript(e.to_string()))?
                .value
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();

            match outcome.as_str() {
                "active" => Ok(()),
                "clicked" => {
                    // The board re-renders after the click
                    std::thread::sleep(Duration::from_millis(500));
                    wait_ready(tab, ready_selector, timeout)
                }
                _ => Err(BrowserError::ElementNotFound(selector.clone())),
            }
        }
    }
}

fn select_filter_script(selector: &str, active_class: &str) -> String {
    // serde_json quoting yields valid JS string literals
    let selector = serde_json::Value::from(selector).to_string();
    let active_class = serde_json::Value::from(active_class).to_string();
    format!(
        r#"(() => {{
            const el = document.querySelector({selector});
            if (!el) return "missing";
            if (el.classList.contains({active_class})) return "active";
            el.click();
            return "clicked";
        }})()"#
    )
}

fn document_height(tab: &Tab) -> Result<u64, BrowserError> {
    tab.evaluate("document.body.scrollHeight", false)
        .map_err(|e| BrowserError::JavaScript(e.to_string()))?
        .value
        .and_then(|v| v.as_f64())
        .map(|h| h.max(0.0) as u64)
        .ok_or_else(|| BrowserError::JavaScript("scrollHeight returned no value".to_string()))
}
