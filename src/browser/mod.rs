//! Headless-browser session layer.
//!
//! One browser process lives per refresh cycle. It is launched through a
//! [`Launcher`], handed out as a cloneable [`Session`] by the
//! [`SessionManager`], and torn down when the cycle ends. Every page render
//! opens its own tab and closes it on every exit path.
//!
//! ```text
//!  SessionManager::acquire ──▶ Launcher::launch ──▶ PageHost (Chrome)
//!         │                                            ▲
//!         ▼                                            │ render(PageRequest)
//!      Session ──────── spawn_blocking ────────────────┘
//! ```

pub mod chrome;
pub mod config;
pub mod scroll;
pub mod session;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;
use std::time::Duration;

pub use chrome::ChromeLauncher;
pub use config::BrowserConfig;
pub use scroll::ScrollPolicy;
pub use session::{Session, SessionManager};

/// A running browser that can render pages.
///
/// Implementations are blocking; [`Session`] moves calls onto the blocking
/// thread pool.
pub trait PageHost: Send + Sync {
    /// Render one page in a fresh page context and return its HTML.
    fn render(&self, request: &PageRequest) -> Result<String, BrowserError>;

    /// Tear the browser down. Renders after this fail.
    fn shutdown(&self);
}

/// Starts browsers. Production uses [`ChromeLauncher`].
pub trait Launcher: Send + Sync {
    fn launch(&self) -> Result<Arc<dyn PageHost>, BrowserError>;
}

/// Everything a page context must do before its HTML is read back.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub url: String,
    /// CSS selector whose presence means the content has settled
    pub ready_selector: String,
    /// Upper bound for navigation and the ready wait
    pub timeout: Duration,
    pub interaction: Option<Interaction>,
    pub scroll: Option<ScrollPolicy>,
}

impl PageRequest {
    pub fn new(
        url: impl Into<String>,
        ready_selector: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        PageRequest {
            url: url.into(),
            ready_selector: ready_selector.into(),
            timeout,
            interaction: None,
            scroll: None,
        }
    }

    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.interaction = Some(interaction);
        self
    }

    pub fn with_scroll(mut self, policy: ScrollPolicy) -> Self {
        self.scroll = Some(policy);
        self
    }
}

/// A UI action that must happen before the content can be queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Click a filter tab unless it already carries `active_class`
    SelectFilter {
        selector: String,
        active_class: String,
    },
}

/// Errors raised inside the browser layer
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Browser initialization failed: {0}")]
    Initialization(String),

    #[error("Browser configuration error: {0}")]
    Configuration(String),

    #[error("Browser is closed")]
    Closed,

    #[error("Tab creation failed: {0}")]
    TabCreation(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("JavaScript execution error: {0}")]
    JavaScript(String),

    #[error("HTML extraction error: {0}")]
    HtmlExtraction(String),
}
