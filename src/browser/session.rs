use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{BrowserError, Launcher, PageHost, PageRequest};
use crate::error::CrawlError;

/// Handle to the browser session of the current cycle.
///
/// Clones share liveness: once the manager releases the session, every
/// clone refuses to render with [`CrawlError::SessionNotReady`].
#[derive(Clone)]
pub struct Session {
    id: u64,
    host: Arc<dyn PageHost>,
    alive: Arc<AtomicBool>,
}

impl Session {
    fn new(id: u64, host: Arc<dyn PageHost>) -> Self {
        Session {
            id,
            host,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Render a page in its own page context on the blocking pool.
    pub async fn render(&self, request: PageRequest) -> Result<String, CrawlError> {
        if !self.is_alive() {
            return Err(CrawlError::SessionNotReady);
        }

        let host = Arc::clone(&self.host);
        let url = request.url.clone();
        let rendered = tokio::task::spawn_blocking(move || host.render(&request))
            .await
            .map_err(|e| CrawlError::ExtractionFailed {
                url: url.clone(),
                cause: format!("render task aborted: {}", e),
            })?;

        rendered.map_err(|e| match e {
            BrowserError::Closed => CrawlError::SessionNotReady,
            other => CrawlError::ExtractionFailed {
                url,
                cause: other.to_string(),
            },
        })
    }

    async fn close(self) {
        self.alive.store(false, Ordering::Release);
        let host = self.host;
        if let Err(e) = tokio::task::spawn_blocking(move || host.shutdown()).await {
            warn!(session = self.id, "browser shutdown task failed: {}", e);
        }
    }
}

/// Owns the single live browser session of the process.
pub struct SessionManager {
    launcher: Arc<dyn Launcher>,
    current: Mutex<Option<Session>>,
    next_id: AtomicU64,
}

impl SessionManager {
    pub fn new(launcher: Arc<dyn Launcher>) -> Self {
        SessionManager {
            launcher,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Launch a new session, releasing any session still alive first.
    pub async fn acquire(&self) -> Result<Session, BrowserError> {
        let mut current = self.current.lock().await;
        if let Some(stale) = current.take() {
            warn!(session = stale.id(), "previous session still alive, closing it");
            stale.close().await;
        }

        let launcher = Arc::clone(&self.launcher);
        let host = tokio::task::spawn_blocking(move || launcher.launch())
            .await
            .map_err(|e| BrowserError::Initialization(format!("launch task aborted: {}", e)))??;

        let session = Session::new(self.next_id.fetch_add(1, Ordering::Relaxed), host);
        info!(session = session.id(), "browser session started");
        *current = Some(session.clone());
        Ok(session)
    }

    /// Tear the current session down. A no-op when none is alive.
    pub async fn release(&self) {
        let taken = self.current.lock().await.take();
        if let Some(session) = taken {
            let id = session.id();
            session.close().await;
            info!(session = id, "browser session closed");
        }
    }

    pub async fn current(&self) -> Result<Session, CrawlError> {
        self.current
            .lock()
            .await
            .clone()
            .ok_or(CrawlError::SessionNotReady)
    }
}
