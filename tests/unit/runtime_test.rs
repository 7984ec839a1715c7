//! Tests for host adapters

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use frameloop::core::Spawn;
use frameloop::runtime::{FrameHost, IdleHost, ManualHost, TimerHost, TokioHost};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_host_spawn() {
    let host = TokioHost::current().unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    host.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_tokio_host_requires_runtime() {
    assert!(TokioHost::current().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_tokio_host_frame_after_interval() {
    let host = TokioHost::current()
        .unwrap()
        .with_frame_interval(Duration::from_millis(10));
    let (tx, rx) = tokio::sync::oneshot::channel();
    let start = tokio::time::Instant::now();
    host.request_frame(Box::new(move || {
        let _ = tx.send(());
    }));
    rx.await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(10));
}

#[tokio::test(start_paused = true)]
async fn test_tokio_host_cancelled_timeout_never_fires() {
    let host = TokioHost::current().unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let handle = host.set_timeout(
        Duration::from_millis(50),
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    handle.cancel();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(handle.is_cancelled());
}

#[test]
fn test_manual_host_frames_requested_during_drain_wait() {
    let host = ManualHost::new();
    let ran = Arc::new(AtomicUsize::new(0));

    let again = host.clone();
    let counter = Arc::clone(&ran);
    host.request_frame(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let counter = Arc::clone(&counter);
        again.request_frame(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }));

    assert_eq!(host.drain_frame(), 1);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(host.pending_frames(), 1);
    assert_eq!(host.drain_frame(), 1);
    assert_eq!(ran.load(Ordering::SeqCst), 2);
}

#[test]
fn test_manual_host_without_idle_returns_callback() {
    let host = ManualHost::without_idle();
    let result = host.request_idle(Box::new(|| {}));
    assert!(result.is_err());
    assert_eq!(host.pending_idle(), 0);
}

#[test]
fn test_manual_host_interval_rearms() {
    let host = ManualHost::new();
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    let handle = host.set_interval(
        Duration::from_millis(10),
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    host.advance(Duration::from_millis(35));
    assert_eq!(ticks.load(Ordering::SeqCst), 3);

    handle.cancel();
    host.advance(Duration::from_millis(50));
    assert_eq!(ticks.load(Ordering::SeqCst), 3);
}
