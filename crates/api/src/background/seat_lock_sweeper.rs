//! Periodic removal of expired seat locks.
//!
//! Expired locks are already invisible to every read; this job reclaims the
//! rows. Failures are logged and the next tick retries.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::ws::SeatGateway;

/// Run the sweep loop until `cancel` is triggered.
///
/// With `broadcast`, every removed lock is announced as `seatUnlocked` to
/// its showtime room.
pub async fn run(
    gateway: Arc<SeatGateway>,
    interval: Duration,
    broadcast: bool,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        broadcast,
        "Seat lock sweeper started"
    );

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; skip it so the first sweep runs
    // one full interval after startup.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Seat lock sweeper stopping");
                break;
            }
            _ = ticker.tick() => {
                match gateway.sweep_expired(broadcast).await {
                    Ok(0) => tracing::debug!("Seat lock sweep: nothing expired"),
                    Ok(removed) => {
                        tracing::info!(removed, "Seat lock sweep: removed expired locks")
                    }
                    Err(e) => tracing::error!(error = %e, "Seat lock sweep failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use cinebook_core::clock::ManualClock;
    use cinebook_core::seat_lock::{InMemoryLockStore, SeatLockManager};

    use super::*;
    use crate::ws::WsManager;

    #[tokio::test(start_paused = true)]
    async fn sweeps_on_interval_and_stops_on_cancel() {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(InMemoryLockStore::new());
        let locks = Arc::new(SeatLockManager::new(
            store.clone(),
            clock.clone(),
            chrono::Duration::minutes(10),
        ));
        let gateway = Arc::new(SeatGateway::new(locks.clone(), Arc::new(WsManager::new())));

        locks.acquire(42, 7, "conn-a").await.unwrap();
        clock.advance(chrono::Duration::minutes(11));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(gateway, Duration::from_secs(60), false, cancel.clone()));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.row_count().await, 0);

        cancel.cancel();
        handle.await.unwrap();
    }
}
