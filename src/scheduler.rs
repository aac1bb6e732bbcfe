//! Periodic refresh trigger.
//!
//! Calls [`RefreshCoordinator::refresh`] every `refresh.interval_secs`
//! until cancelled. The first tick fires one interval after start; the
//! initial refresh is the caller's job. Failed refreshes are logged by the
//! coordinator and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::coordinator::{RefreshCoordinator, RefreshOutcome};
use crate::error::RefreshError;

/// Spawn a task that calls [`RefreshCoordinator::refresh`] every `period`.
///
/// The first tick fires one `period` after spawning. The task exits when
/// `cancel` fires.
pub fn spawn_scheduler(
    coordinator: Arc<RefreshCoordinator>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(?period, "refresh scheduler running");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match coordinator.refresh(&cancel).await {
                Ok(RefreshOutcome::Unchanged) => tracing::debug!("scheduled refresh: unchanged"),
                Ok(RefreshOutcome::Published(summary)) => {
                    tracing::debug!(chains = summary.chains, "scheduled refresh: published")
                }
                Err(RefreshError::Cancelled) => break,
                // Already logged by the coordinator.
                Err(_) => {}
            }
        }

        tracing::info!("refresh scheduler stopped");
    })
}
