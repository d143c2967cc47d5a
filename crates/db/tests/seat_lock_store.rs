//! Integration tests for the Postgres lock store behind `SeatLockManager`.
//!
//! Time is driven by a `ManualClock`; the store only ever compares against
//! the manager's `now`, so expiry is deterministic against a real database.

use std::sync::Arc;

use assert_matches::assert_matches;
use cinebook_core::clock::{Clock, ManualClock};
use cinebook_core::seat_lock::{SeatKey, SeatLockError, SeatLockManager};
use cinebook_db::PgLockStore;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn manager(pool: &PgPool) -> (Arc<SeatLockManager>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    let manager = SeatLockManager::new(
        Arc::new(PgLockStore::new(pool.clone())),
        clock.clone(),
        chrono::Duration::minutes(10),
    );
    (Arc::new(manager), clock)
}

async fn row_count(pool: &PgPool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM seat_locks")
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

// ---------------------------------------------------------------------------
// Test: a different holder is rejected while the lock is live
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_conflicting_acquire_is_rejected(pool: PgPool) {
    let (manager, _clock) = manager(&pool);

    manager.acquire(42, 7, "conn-a").await.unwrap();
    let err = manager.acquire(42, 7, "conn-b").await.unwrap_err();
    assert_matches!(
        err,
        SeatLockError::Conflict {
            showtime_id: 42,
            seat_id: 7
        }
    );

    let lock = manager.peek(42, 7).await.unwrap().unwrap();
    assert_eq!(lock.session_id, "conn-a");
}

// ---------------------------------------------------------------------------
// Test: same-holder re-acquire extends and never shortens
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_same_holder_reacquire_extends_expiry(pool: PgPool) {
    let (manager, clock) = manager(&pool);

    let first = manager.acquire(42, 7, "conn-a").await.unwrap();
    clock.advance(chrono::Duration::minutes(4));
    let second = manager.acquire(42, 7, "conn-a").await.unwrap();
    assert!(second.expires_at > first.expires_at);

    // A refresh computed from an earlier instant keeps the later expiry.
    clock.advance(chrono::Duration::minutes(-2));
    let third = manager.acquire(42, 7, "conn-a").await.unwrap();
    assert_eq!(third.expires_at, second.expires_at);
}

// ---------------------------------------------------------------------------
// Test: an expired lock is invisible, can be taken over, and is swept
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_lock_lifecycle(pool: PgPool) {
    let (manager, clock) = manager(&pool);

    manager.acquire(42, 7, "conn-a").await.unwrap();
    manager.acquire(42, 8, "conn-a").await.unwrap();
    clock.advance(chrono::Duration::minutes(11));

    assert!(manager.peek(42, 7).await.unwrap().is_none());
    assert!(manager.list_active(42).await.unwrap().is_empty());
    assert_eq!(row_count(&pool).await, 2);

    let taken = manager.acquire(42, 7, "conn-b").await.unwrap();
    assert_eq!(taken.session_id, "conn-b");

    let swept = manager.sweep_expired().await.unwrap();
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].seat_id, 8);
    assert_eq!(row_count(&pool).await, 1);
}

// ---------------------------------------------------------------------------
// Test: exactly one winner among concurrent acquirers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_acquires_have_single_winner(pool: PgPool) {
    let (manager, _clock) = manager(&pool);

    let mut handles = Vec::new();
    for i in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager.acquire(42, 7, &format!("conn-{i}")).await
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(lock) => winners.push(lock.session_id),
            Err(SeatLockError::Conflict { .. }) => {}
            Err(e) => panic!("unexpected store error: {e}"),
        }
    }

    assert_eq!(winners.len(), 1);
    let lock = manager.peek(42, 7).await.unwrap().unwrap();
    assert_eq!(lock.session_id, winners[0]);
}

// ---------------------------------------------------------------------------
// Test: release semantics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_release_only_by_holder(pool: PgPool) {
    let (manager, _clock) = manager(&pool);
    manager.acquire(42, 7, "conn-a").await.unwrap();

    assert!(!manager.release(42, 7, "conn-b").await.unwrap());
    assert!(manager.peek(42, 7).await.unwrap().is_some());

    assert!(manager.release(42, 7, "conn-a").await.unwrap());
    assert!(!manager.release(42, 7, "conn-a").await.unwrap());
    assert_eq!(row_count(&pool).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_release_all_by_holder_spans_showtimes(pool: PgPool) {
    let (manager, clock) = manager(&pool);
    manager.acquire(42, 1, "conn-a").await.unwrap();
    manager.acquire(43, 1, "conn-a").await.unwrap();
    manager.acquire(42, 2, "conn-b").await.unwrap();

    let mut released = manager.release_all_by_holder("conn-a").await.unwrap();
    released.sort();
    assert_eq!(released, vec![SeatKey::new(42, 1), SeatKey::new(43, 1)]);

    let remaining = manager.list_active(42).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].session_id, "conn-b");
    assert!(clock.now() < remaining[0].expires_at);
}
