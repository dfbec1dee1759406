//! Last published snapshot per kind.
//!
//! The scheduler is the only writer. A publish swaps one `Arc` under a short
//! write lock; readers clone the `Arc` under a read lock and keep using their
//! snapshot even after a newer one replaces it. Nothing here waits on a build.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::CacheNotReady;
use crate::models::{Snapshot, SnapshotKind};

#[derive(Clone, Default)]
pub struct SnapshotCache {
    inner: Arc<RwLock<CacheInner>>,
}

#[derive(Default)]
struct CacheInner {
    full: Option<Arc<Snapshot>>,
    today: Option<Arc<Snapshot>>,
}

impl CacheInner {
    fn slot(&mut self, kind: SnapshotKind) -> &mut Option<Arc<Snapshot>> {
        match kind {
            SnapshotKind::Full => &mut self.full,
            SnapshotKind::Today => &mut self.today,
        }
    }
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot of `snapshot.kind` and return the shared handle.
    pub async fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let kind = snapshot.kind;
        let matches = snapshot.match_count();
        let snapshot = Arc::new(snapshot);
        let previous = self
            .inner
            .write()
            .await
            .slot(kind)
            .replace(Arc::clone(&snapshot));
        debug!(
            kind = %kind,
            matches,
            replaced = previous.is_some(),
            "snapshot published"
        );
        snapshot
    }

    /// Latest snapshot of `kind`, or [`CacheNotReady`] before its first publish.
    pub async fn read(&self, kind: SnapshotKind) -> Result<Arc<Snapshot>, CacheNotReady> {
        let inner = self.inner.read().await;
        let slot = match kind {
            SnapshotKind::Full => &inner.full,
            SnapshotKind::Today => &inner.today,
        };
        slot.clone().ok_or(CacheNotReady { kind })
    }
}
