use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::browser::{BrowserConfig, ScrollPolicy};
use crate::extract::ExtractOptions;

/// Headless-browser match crawler serving cached snapshots over HTTP
#[derive(Parser, Debug, Clone)]
#[command(name = "matchboard", version, about)]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Base URL of the match source
    #[arg(
        long,
        env = "SOURCE_BASE_URL",
        default_value = "https://www.betexplorer.com"
    )]
    pub source_base_url: String,

    /// Sport path segment on the source
    #[arg(long, env = "SPORT", default_value = "football")]
    pub sport: String,

    /// JSON file listing the competitions to crawl
    #[arg(long, env = "SOURCES_PATH", default_value = "sources.json")]
    pub sources_path: PathBuf,

    /// Seconds between refresh cycles
    #[arg(long, env = "CYCLE_SECS", default_value = "60")]
    pub cycle_secs: u64,

    /// Rebuild the full snapshot every N cycles
    #[arg(long, env = "FULL_REFRESH_EVERY", default_value = "10")]
    pub full_refresh_every: u64,

    /// Sources crawled at the same time within one build
    #[arg(long, env = "CRAWL_CONCURRENCY", default_value = "4")]
    pub crawl_concurrency: usize,

    /// Upper bound for navigation plus the content wait, in seconds
    #[arg(long, env = "NAVIGATION_TIMEOUT_SECS", default_value = "30")]
    pub navigation_timeout_secs: u64,

    /// Page height must stay unchanged this long before scrolling stops (ms)
    #[arg(long, env = "SCROLL_QUIET_MS", default_value = "2000")]
    pub scroll_quiet_ms: u64,

    /// Hard cap on scroll rounds per page
    #[arg(long, env = "SCROLL_MAX_ROUNDS", default_value = "40")]
    pub scroll_max_rounds: u32,

    /// Run Chrome without a window
    #[arg(long, env = "HEADLESS", default_value = "true", action = clap::ArgAction::Set)]
    pub headless: bool,

    /// Chrome/Chromium binary; auto-detected when unset
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Single-match result lookups per source (0 disables)
    #[arg(long, env = "RESULT_LOOKUPS", default_value = "5")]
    pub result_lookups: usize,

    /// Fraction of empty sources that raises the markup-drift warning
    #[arg(long, env = "DRIFT_ALARM_RATIO", default_value = "0.5")]
    pub drift_alarm_ratio: f64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Err(e) = url::Url::parse(&self.source_base_url) {
            anyhow::bail!("SOURCE_BASE_URL is not a valid URL: {}", e);
        }
        if self.sport.trim().is_empty() {
            anyhow::bail!("sport must not be empty");
        }
        if self.cycle_secs == 0 {
            anyhow::bail!("cycle_secs must be positive");
        }
        if self.full_refresh_every == 0 {
            anyhow::bail!("full_refresh_every must be at least 1");
        }
        if self.crawl_concurrency == 0 {
            anyhow::bail!("crawl_concurrency must be at least 1");
        }
        if self.navigation_timeout_secs == 0 {
            anyhow::bail!("navigation_timeout_secs must be positive");
        }
        if self.scroll_max_rounds == 0 {
            anyhow::bail!("scroll_max_rounds must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.drift_alarm_ratio) {
            anyhow::bail!("drift_alarm_ratio must be between 0.0 and 1.0");
        }
        Ok(())
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs(self.cycle_secs)
    }

    pub fn browser(&self) -> BrowserConfig {
        BrowserConfig {
            headless: self.headless,
            chrome_path: self.chrome_path.clone(),
            ..BrowserConfig::default()
        }
    }

    pub fn scroll_policy(&self) -> ScrollPolicy {
        ScrollPolicy {
            quiet_window: Duration::from_millis(self.scroll_quiet_ms),
            max_rounds: self.scroll_max_rounds,
            ..ScrollPolicy::default()
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            timeout: Duration::from_secs(self.navigation_timeout_secs),
            scroll: self.scroll_policy(),
        }
    }
}
