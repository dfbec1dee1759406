//! Background refresh loop.
//!
//! Every tick launches a fresh browser session, rebuilds the TODAY snapshot
//! (and FULL every `full_refresh_every` ticks), publishes what succeeded and
//! releases the session again. A failed refresh leaves the previously
//! published snapshot in place.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::browser::SessionManager;
use crate::cache::SnapshotCache;
use crate::crawl::{BuildReport, SnapshotBuilder, SourceCatalog};
use crate::models::SnapshotKind;

/// Why a refresh published nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    LaunchFailed,
    SessionNotReady,
    /// Every source of the build failed
    TotalFailure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Published(BuildReport),
    Skipped(SkipReason),
}

/// Refreshes attempted by one tick, in the order they ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleOutcome {
    pub refreshes: Vec<(SnapshotKind, RefreshOutcome)>,
}

impl CycleOutcome {
    pub fn outcome(&self, kind: SnapshotKind) -> Option<&RefreshOutcome> {
        self.refreshes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }
}

/// Snapshot kinds due at `tick`. TODAY runs every tick, FULL on multiples of
/// `full_refresh_every` (tick 0 included).
pub fn kinds_for_tick(tick: u64, full_refresh_every: u64) -> Vec<SnapshotKind> {
    let mut kinds = vec![SnapshotKind::Today];
    if tick % full_refresh_every.max(1) == 0 {
        kinds.push(SnapshotKind::Full);
    }
    kinds
}

pub struct RefreshScheduler {
    sessions: Arc<SessionManager>,
    builder: SnapshotBuilder,
    cache: SnapshotCache,
    catalog: Arc<SourceCatalog>,
    period: Duration,
    full_refresh_every: u64,
    shutdown: Arc<Notify>,
}

impl RefreshScheduler {
    pub fn new(
        sessions: Arc<SessionManager>,
        builder: SnapshotBuilder,
        cache: SnapshotCache,
        catalog: Arc<SourceCatalog>,
        period: Duration,
        full_refresh_every: u64,
        shutdown: Arc<Notify>,
    ) -> Self {
        RefreshScheduler {
            sessions,
            builder,
            cache,
            catalog,
            period,
            full_refresh_every: full_refresh_every.max(1),
            shutdown,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Tick until the shutdown signal. Shutdown is observed between cycles;
    /// a running cycle always finishes and releases its session.
    pub async fn run(self) {
        info!(
            period = ?self.period,
            full_refresh_every = self.full_refresh_every,
            sources = self.catalog.len(),
            "refresh scheduler started"
        );

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut tick: u64 = 0;
        let shutdown = Arc::clone(&self.shutdown);

        loop {
            let notified = shutdown.notified();
            tokio::pin!(notified);
            tokio::select! {
                _ = &mut notified => {
                    info!("refresh scheduler received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    self.run_cycle(tick).await;
                    tick = tick.wrapping_add(1);
                }
            }
        }

        self.sessions.release().await;
    }

    /// One tick: acquire a session, refresh every due kind, release.
    pub async fn run_cycle(&self, tick: u64) -> CycleOutcome {
        let kinds = kinds_for_tick(tick, self.full_refresh_every);
        info!(tick, kinds = ?kinds, "refresh cycle started");

        if let Err(e) = self.sessions.acquire().await {
            warn!(tick, "browser launch failed, keeping previous snapshots: {}", e);
            return CycleOutcome {
                refreshes: kinds
                    .into_iter()
                    .map(|kind| (kind, RefreshOutcome::Skipped(SkipReason::LaunchFailed)))
                    .collect(),
            };
        }

        let mut outcome = CycleOutcome::default();
        for kind in kinds {
            let result = self.refresh(kind).await;
            outcome.refreshes.push((kind, result));
        }

        self.sessions.release().await;
        info!(tick, "refresh cycle finished");
        outcome
    }

    /// Build `kind` on the cycle's session and publish it unless it failed.
    async fn refresh(&self, kind: SnapshotKind) -> RefreshOutcome {
        let session = match self.sessions.current().await {
            Ok(session) => session,
            Err(e) => {
                error!(kind = %kind, "no browser session for refresh: {}", e);
                return RefreshOutcome::Skipped(SkipReason::SessionNotReady);
            }
        };

        let sources = self.catalog.for_snapshot(kind);
        match self.builder.build(&session, kind, &sources).await {
            Ok((_, report)) if report.total_failure() => {
                warn!(
                    kind = %kind,
                    sources = report.sources,
                    "every source failed, not publishing"
                );
                RefreshOutcome::Skipped(SkipReason::TotalFailure)
            }
            Ok((snapshot, report)) => {
                let published = self.cache.publish(snapshot).await;
                info!(
                    kind = %kind,
                    matches = published.match_count(),
                    built_at = %published.built_at,
                    "snapshot published"
                );
                RefreshOutcome::Published(report)
            }
            // Only a lost session escapes the per-source isolation
            Err(e) => {
                error!(kind = %kind, "browser session lost mid-build, refresh skipped: {}", e);
                RefreshOutcome::Skipped(SkipReason::SessionNotReady)
            }
        }
    }
}
