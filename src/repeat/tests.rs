use std::time::Duration;

use super::*;
use crate::mock::MockCommand;

const EVERY: Duration = Duration::from_millis(100);

#[tokio::test(start_paused = true)]
async fn test_first_firing_waits_one_interval() {
    let mock = MockCommand::<()>::new();
    let executor = RepeatExecutor::new(mock.clone(), EVERY);

    executor.start(()).await;
    assert!(executor.is_started().await);

    tokio::time::sleep(Duration::from_millis(99)).await;
    assert_eq!(mock.call_count().await, 0);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(mock.call_count().await, 1);

    executor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_fires_every_interval_until_stopped() {
    let mock = MockCommand::<()>::new();
    let executor = RepeatExecutor::new(mock.clone(), EVERY);

    executor.start(()).await;
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(mock.call_count().await, 2);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(mock.call_count().await, 3);

    executor.stop().await;
    assert!(!executor.is_started().await);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(mock.call_count().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_double_start_is_a_no_op() {
    let mock = MockCommand::<()>::new();
    let executor = RepeatExecutor::new(mock.clone(), EVERY);

    executor.start(()).await;
    executor.start(()).await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    // A second timer would have fired twice here.
    assert_eq!(mock.call_count().await, 1);

    executor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_start_is_a_no_op() {
    let executor = RepeatExecutor::new(MockCommand::<()>::new(), EVERY);
    executor.stop().await;
    assert!(!executor.is_started().await);
}

#[tokio::test(start_paused = true)]
async fn test_slow_run_does_not_block_ticks() {
    let mock = MockCommand::<()>::new();
    mock.hold().await;
    let executor = RepeatExecutor::new(mock.clone(), EVERY);

    executor.start(()).await;
    tokio::time::sleep(Duration::from_millis(350)).await;

    // Three firings, all still held at the gate.
    assert_eq!(mock.call_count().await, 3);
    assert_eq!(executor.state().running, 3);

    executor.stop().await;
    mock.release(3).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(executor.state().running, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_does_not_abort_in_flight_run() {
    let mock = MockCommand::<()>::new();
    mock.hold().await;
    let executor = RepeatExecutor::new(mock.clone(), EVERY);

    executor.start(()).await;
    tokio::time::sleep(Duration::from_millis(101)).await;
    assert_eq!(executor.state().running, 1);

    executor.stop().await;
    mock.release(1).await;
    tokio::time::sleep(Duration::from_millis(1)).await;

    let snapshot = executor.state();
    assert_eq!(snapshot.running, 0);
    assert!(snapshot.was_run_fine);
}
