//! Background eviction of abandoned rooms.
//!
//! Nothing ever deletes a room explicitly: participants simply stop
//! sending requests. Without the reaper those rooms would stay in the
//! store until the process exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::{RoomCoordinator, RoomStore};

const MIN_PERIOD: Duration = Duration::from_millis(100);

/// Spawns a task that periodically evicts idle rooms.
///
/// Uses `RoomConfig::reap_interval` as the scan period and
/// `RoomConfig::reap_grace` as the idle allowance past a round's
/// deadline. Returns `None` (and spawns nothing) when `reap_grace` is
/// `None`. Abort the returned handle to stop the reaper.
pub fn spawn_reaper<S: RoomStore>(
    coordinator: Arc<RoomCoordinator<S>>,
) -> Option<JoinHandle<()>> {
    let grace = coordinator.config().reap_grace?;
    // `time::interval` panics on a zero period.
    let period = coordinator.config().reap_interval.max(MIN_PERIOD);

    Some(tokio::spawn(async move {
        tracing::info!(?period, ?grace, "room reaper started");
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; skip it so a freshly
        // started server doesn't scan an empty store.
        interval.tick().await;

        loop {
            interval.tick().await;
            match coordinator.evict_expired(grace).await {
                Ok(evicted) if !evicted.is_empty() => {
                    tracing::debug!(count = evicted.len(), "reaper pass");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "reaper pass failed");
                }
            }
        }
    }))
}
