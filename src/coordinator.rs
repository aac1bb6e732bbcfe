//! Refresh coordinator.
//!
//! Gates refresh passes behind change detection, runs at most one pass at a
//! time, and owns the watermark (the time of the last successful refresh).
//!
//! # States
//!
//! ```text
//!            trigger                     unchanged: watermark := check time
//!   Idle ─────────────▶ Refreshing ──────────────────────────────▶ Idle
//!    ▲                     │  published: watermark := built_at
//!    └─────────────────────┘  failed / cancelled: watermark kept
//! ```
//!
//! A trigger arriving while a pass is in flight does not start a second
//! pass; it waits for the running one and receives the same outcome.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::builder::{cancellable, IndexBuilder};
use crate::error::{RefreshError, Result};
use crate::published::PublishedIndex;
use skymap_core::snapshot::Snapshot;

/// Counts describing a published snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub chains: usize,
    pub resolved: usize,
    pub assets: usize,
    pub built_at: DateTime<Utc>,
}

impl RefreshSummary {
    fn of(snapshot: &Snapshot) -> Self {
        Self {
            chains: snapshot.chains().len(),
            resolved: snapshot.resolved_count(),
            assets: snapshot.assets().len(),
            built_at: snapshot.built_at(),
        }
    }
}

/// What a successful refresh did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The remote reported no changes; the published snapshot was kept.
    Unchanged,
    /// A new snapshot was built and published.
    Published(RefreshSummary),
}

type Shared = Option<Result<RefreshOutcome>>;

enum Role {
    Leader(watch::Sender<Shared>),
    Follower(watch::Receiver<Shared>),
}

/// Single-flight refresh of one [`PublishedIndex`].
///
/// Concurrent callers share the pass already running instead of starting
/// another one.
pub struct RefreshCoordinator {
    builder: IndexBuilder,
    index: Arc<PublishedIndex>,
    watermark: Mutex<DateTime<Utc>>,
    in_flight: Mutex<Option<watch::Receiver<Shared>>>,
}

/// Returns the coordinator to `Idle` even if the leading task is dropped.
struct InFlightGuard<'a> {
    slot: &'a Mutex<Option<watch::Receiver<Shared>>>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        *lock(self.slot) = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RefreshCoordinator {
    pub fn new(builder: IndexBuilder, index: Arc<PublishedIndex>) -> Self {
        Self {
            builder,
            index,
            watermark: Mutex::new(DateTime::<Utc>::UNIX_EPOCH),
            in_flight: Mutex::new(None),
        }
    }

    pub fn index(&self) -> &Arc<PublishedIndex> {
        &self.index
    }

    /// Time of the last successful refresh or confirmed no-op check.
    pub fn last_success(&self) -> DateTime<Utc> {
        *lock(&self.watermark)
    }

    pub fn is_refreshing(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// Refresh if the remote changed since the last success.
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<RefreshOutcome> {
        self.run(cancel, false).await
    }

    /// Rebuild the index without asking the remote whether it changed.
    pub async fn refresh_forced(&self, cancel: &CancellationToken) -> Result<RefreshOutcome> {
        self.run(cancel, true).await
    }

    async fn run(&self, cancel: &CancellationToken, force: bool) -> Result<RefreshOutcome> {
        let role = {
            let mut slot = lock(&self.in_flight);
            match slot.as_ref() {
                Some(rx) => Role::Follower(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *slot = Some(rx);
                    Role::Leader(tx)
                }
            }
        };

        let tx = match role {
            Role::Follower(rx) => {
                tracing::debug!("refresh already in flight; waiting for its outcome");
                // The leader keeps running when only this caller is cancelled.
                return tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(RefreshError::Cancelled),
                    outcome = wait_for_outcome(rx) => outcome,
                };
            }
            Role::Leader(tx) => tx,
        };

        let guard = InFlightGuard {
            slot: &self.in_flight,
        };
        let outcome = self.pass(cancel, force).await;
        drop(guard);

        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "registry refresh failed; keeping previous snapshot");
        }
        // Nobody may be waiting; that is fine.
        let _ = tx.send(Some(outcome.clone()));
        outcome
    }

    async fn pass(&self, cancel: &CancellationToken, force: bool) -> Result<RefreshOutcome> {
        let since = self.last_success();
        let checked_at = Utc::now();

        if !force {
            let changed =
                cancellable(cancel, self.builder.remote().has_changed_since(since)).await?;
            if !changed {
                tracing::info!(%since, "no registry changes since last refresh");
                self.advance_watermark(checked_at);
                return Ok(RefreshOutcome::Unchanged);
            }
        }

        let snapshot = self.builder.build(cancel).await?;
        if cancel.is_cancelled() {
            return Err(RefreshError::Cancelled);
        }

        let summary = RefreshSummary::of(&snapshot);
        self.index.publish(snapshot);
        self.advance_watermark(summary.built_at);
        tracing::info!(
            chains = summary.chains,
            resolved = summary.resolved,
            assets = summary.assets,
            "published registry snapshot"
        );
        Ok(RefreshOutcome::Published(summary))
    }

    fn advance_watermark(&self, to: DateTime<Utc>) {
        let mut watermark = lock(&self.watermark);
        if to > *watermark {
            *watermark = to;
        }
    }
}

async fn wait_for_outcome(mut rx: watch::Receiver<Shared>) -> Result<RefreshOutcome> {
    let outcome = match rx.wait_for(Option::is_some).await {
        Ok(shared) => (*shared).clone(),
        // The leading task went away without reporting.
        Err(_) => None,
    };
    outcome.unwrap_or(Err(RefreshError::Cancelled))
}
