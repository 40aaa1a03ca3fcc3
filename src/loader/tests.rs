use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::Semaphore;

use super::*;
use crate::command::command_fn;
use crate::mock::MockFailure;

/// Page command over `0..total`, logging each `(pointer, per_step)` request.
fn paged_source(
    total: usize,
    log: Arc<StdMutex<Vec<(usize, usize)>>>,
    gate: Option<Arc<Semaphore>>,
    fail: Arc<AtomicBool>,
) -> impl crate::command::Command<Params = (usize, usize), Ok = Vec<usize>, Err = MockFailure> {
    command_fn(move |(pointer, per_step): (usize, usize)| {
        let log = log.clone();
        let gate = gate.clone();
        let fail = fail.clone();
        async move {
            log.lock().unwrap().push((pointer, per_step));
            if let Some(gate) = gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            if fail.load(Ordering::Relaxed) {
                return Err(MockFailure("page load failed".into()));
            }
            Ok((pointer..total.min(pointer + per_step)).collect())
        }
    })
}

fn plain_source(
    total: usize,
) -> impl crate::command::Command<Params = (usize, usize), Ok = Vec<usize>, Err = MockFailure> {
    paged_source(
        total,
        Arc::new(StdMutex::new(Vec::new())),
        None,
        Arc::new(AtomicBool::new(false)),
    )
}

#[tokio::test]
async fn test_next_accumulates_in_order() {
    let loader = InfiniteLoader::with_per_step(plain_source(100), 10);

    assert_eq!(loader.next().await, Ok(NextOutcome::Loaded(10)));
    assert_eq!(loader.next().await, Ok(NextOutcome::Loaded(10)));

    let items = loader.items().await;
    assert_eq!(items.len(), 20);
    assert_eq!(items[19], 19);

    let snapshot = loader.snapshot().await;
    assert_eq!(snapshot.pointer, 20);
    assert!(!snapshot.is_finished);
    assert!(!snapshot.is_running);

    assert_eq!(loader.refresh().await, Ok(RefreshOutcome::Refreshed(10)));
    let items = loader.items().await;
    assert_eq!(items.len(), 10);
    assert_eq!(items[9], 9);
    assert_eq!(loader.snapshot().await.pointer, 10);
}

#[tokio::test]
async fn test_short_page_finishes_the_series() {
    let loader = InfiniteLoader::with_per_step(plain_source(25), 10);

    assert_eq!(loader.next().await, Ok(NextOutcome::Loaded(10)));
    assert_eq!(loader.next().await, Ok(NextOutcome::Loaded(10)));
    assert_eq!(loader.next().await, Ok(NextOutcome::Loaded(5)));
    assert!(loader.is_finished().await);

    assert_eq!(loader.next().await, Ok(NextOutcome::Finished));
    assert_eq!(loader.items().await, (0..25).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_exact_multiple_needs_the_empty_page() {
    let loader = InfiniteLoader::with_per_step(plain_source(20), 10);

    assert_eq!(loader.next().await, Ok(NextOutcome::Loaded(10)));
    assert_eq!(loader.next().await, Ok(NextOutcome::Loaded(10)));
    // A full last page does not finish the series.
    assert!(!loader.is_finished().await);

    assert_eq!(loader.next().await, Ok(NextOutcome::Loaded(0)));
    assert!(loader.is_finished().await);
    assert_eq!(loader.items().await.len(), 20);
}

#[tokio::test(start_paused = true)]
async fn test_next_is_ignored_while_loading() {
    let log = Arc::new(StdMutex::new(Vec::new()));
    let gate = Arc::new(Semaphore::new(0));
    let loader = Arc::new(InfiniteLoader::with_per_step(
        paged_source(
            100,
            log.clone(),
            Some(gate.clone()),
            Arc::new(AtomicBool::new(false)),
        ),
        10,
    ));

    let in_flight = tokio::spawn({
        let loader = loader.clone();
        async move { loader.next().await }
    });
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(loader.is_running().await);

    // Dropped, not queued: no second page request happens.
    assert_eq!(loader.next().await, Ok(NextOutcome::Ignored));
    assert_eq!(log.lock().unwrap().len(), 1);

    gate.add_permits(1);
    assert_eq!(in_flight.await.unwrap(), Ok(NextOutcome::Loaded(10)));
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_mid_load_is_queued_once() {
    let log = Arc::new(StdMutex::new(Vec::new()));
    let gate = Arc::new(Semaphore::new(0));
    let loader = Arc::new(InfiniteLoader::with_per_step(
        paged_source(
            100,
            log.clone(),
            Some(gate.clone()),
            Arc::new(AtomicBool::new(false)),
        ),
        10,
    ));

    let in_flight = tokio::spawn({
        let loader = loader.clone();
        async move { loader.next().await }
    });
    tokio::time::sleep(Duration::from_millis(1)).await;

    // Both refresh requests coalesce into one pending slot.
    assert_eq!(loader.refresh().await, Ok(RefreshOutcome::Queued));
    assert_eq!(loader.refresh().await, Ok(RefreshOutcome::Queued));
    assert!(loader.is_refreshing().await);

    gate.add_permits(2);
    assert_eq!(in_flight.await.unwrap(), Ok(NextOutcome::Loaded(10)));
    tokio::time::sleep(Duration::from_millis(1)).await;

    // Exactly one reload ran, replacing the appended page.
    assert_eq!(*log.lock().unwrap(), vec![(0, 10), (0, 10)]);
    let snapshot = loader.snapshot().await;
    assert_eq!(snapshot.len, 10);
    assert_eq!(snapshot.pointer, 10);
    assert!(!snapshot.is_running);
    assert!(!snapshot.is_refreshing);
}

#[tokio::test]
async fn test_failed_load_leaves_pagination_untouched() {
    let fail = Arc::new(AtomicBool::new(true));
    let loader = InfiniteLoader::with_per_step(
        paged_source(
            100,
            Arc::new(StdMutex::new(Vec::new())),
            None,
            fail.clone(),
        ),
        10,
    );

    assert_eq!(
        loader.next().await,
        Err(MockFailure("page load failed".into()))
    );
    let snapshot = loader.snapshot().await;
    assert_eq!(snapshot.len, 0);
    assert_eq!(snapshot.pointer, 0);
    assert!(!snapshot.is_running);
    assert!(!snapshot.is_finished);

    fail.store(false, Ordering::Relaxed);
    assert_eq!(loader.next().await, Ok(NextOutcome::Loaded(10)));
    assert_eq!(loader.items().await.len(), 10);
}

#[tokio::test]
async fn test_refresh_restarts_a_finished_series() {
    let loader = InfiniteLoader::with_per_step(plain_source(5), 10);

    assert_eq!(loader.next().await, Ok(NextOutcome::Loaded(5)));
    assert!(loader.is_finished().await);
    assert_eq!(loader.next().await, Ok(NextOutcome::Finished));

    assert_eq!(loader.refresh().await, Ok(RefreshOutcome::Refreshed(5)));
    assert_eq!(loader.items().await, vec![0, 1, 2, 3, 4]);
    assert!(loader.is_finished().await);
    assert_eq!(loader.state().run_count, 2);
}

#[tokio::test]
async fn test_per_step_defaults_and_clamping() {
    let loader = InfiniteLoader::new(plain_source(100));
    assert_eq!(loader.per_step(), DEFAULT_PER_STEP);

    let clamped = InfiniteLoader::with_per_step(plain_source(100), 0);
    assert_eq!(clamped.per_step(), 1);
}
