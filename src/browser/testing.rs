//! In-memory browser used by tests: serves fixed HTML per URL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{BrowserError, Launcher, PageHost, PageRequest};

#[derive(Clone, Default)]
pub struct FixturePages {
    pages: HashMap<String, Result<String, String>>,
}

impl FixturePages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(html.to_string()));
        self
    }

    /// Navigation to `url` times out.
    pub fn failing(mut self, url: &str) -> Self {
        self.pages
            .insert(url.to_string(), Err(format!("navigation timed out: {}", url)));
        self
    }
}

pub struct FixtureLauncher {
    pages: FixturePages,
    fail_launch: bool,
    launches: AtomicUsize,
    live_hosts: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl FixtureLauncher {
    pub fn new(pages: FixturePages) -> Self {
        FixtureLauncher {
            pages,
            fail_launch: false,
            launches: AtomicUsize::new(0),
            live_hosts: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        FixtureLauncher {
            fail_launch: true,
            ..Self::new(FixturePages::new())
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn live_hosts(&self) -> usize {
        self.live_hosts.load(Ordering::SeqCst)
    }

    /// Every page request rendered by any host of this launcher
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Launcher for FixtureLauncher {
    fn launch(&self) -> Result<Arc<dyn PageHost>, BrowserError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail_launch {
            return Err(BrowserError::Initialization("chrome not found".to_string()));
        }
        self.live_hosts.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FixtureHost {
            pages: self.pages.clone(),
            closed: AtomicBool::new(false),
            live_hosts: Arc::clone(&self.live_hosts),
            requests: Arc::clone(&self.requests),
        }))
    }
}

struct FixtureHost {
    pages: FixturePages,
    closed: AtomicBool,
    live_hosts: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl PageHost for FixtureHost {
    fn render(&self, request: &PageRequest) -> Result<String, BrowserError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrowserError::Closed);
        }
        self.requests.lock().unwrap().push(request.clone());
        match self.pages.pages.get(&request.url) {
            Some(Ok(html)) => Ok(html.clone()),
            Some(Err(cause)) => Err(BrowserError::Navigation(cause.clone())),
            None => Err(BrowserError::Timeout(format!(
                "selector {} on {}",
                request.ready_selector, request.url
            ))),
        }
    }

    fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.live_hosts.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
