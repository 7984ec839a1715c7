//! Tests for building a runtime context from configuration

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use frameloop::builders::build_runtime;
use frameloop::config::{MemoConfig, RuntimeConfig};
use frameloop::core::{Priority, RuntimeError};
use frameloop::runtime::TokioHost;

#[tokio::test]
async fn test_build_runtime_from_defaults() {
    let cfg = RuntimeConfig::default();
    let ctx = build_runtime(&cfg, TokioHost::current().unwrap()).unwrap();

    assert_eq!(ctx.executor.concurrency(), cfg.executor.concurrency);
    assert_eq!(ctx.host.frame_interval(), Duration::from_millis(16));
    assert!(ctx.registry.is_empty());
    assert_eq!(ctx.rolling_stats().unwrap().capacity(), cfg.stats.window);
    assert_eq!(ctx.viewport().unwrap().visible_count(), 14);
}

#[tokio::test]
async fn test_build_runtime_rejects_invalid_config() {
    let cfg = RuntimeConfig {
        memo: MemoConfig { capacity: 0 },
        ..RuntimeConfig::default()
    };
    let result = build_runtime(&cfg, TokioHost::current().unwrap());
    assert!(matches!(result, Err(RuntimeError::InvalidConfig(_))));
}

#[tokio::test(start_paused = true)]
async fn test_context_components_share_host() {
    let ctx = build_runtime(&RuntimeConfig::default(), TokioHost::current().unwrap()).unwrap();
    let ran = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&ran);
    ctx.batcher.schedule(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = Arc::clone(&ran);
    ctx.scheduler.add(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
        Priority::HIGH,
    );
    let counter = Arc::clone(&ran);
    ctx.executor.add(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    ctx.executor.wait_idle().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ran.load(Ordering::SeqCst), 3);
    assert!(!ctx.batcher.is_flush_scheduled());
    assert!(!ctx.scheduler.is_running());
}

#[tokio::test]
async fn test_context_factories_use_config() {
    let cfg = RuntimeConfig::from_json_str(r#"{"memo":{"capacity":1},"pool":{"max_concurrency":2}}"#)
        .unwrap();
    let ctx = build_runtime(&cfg, TokioHost::current().unwrap()).unwrap();

    let double = ctx.memoize(|x: u32| x * 2).unwrap();
    assert_eq!(double.call(2).unwrap(), 4);
    assert_eq!(double.call(3).unwrap(), 6);
    assert_eq!(double.len(), 1);

    let pool = ctx.pool::<u32>().unwrap();
    assert_eq!(pool.stats().concurrency, 2);

    let mut cache = ctx.ttl_cache::<&str, u32>().unwrap();
    cache.set("xp", 10);
    assert_eq!(cache.get("xp"), Some(&10));
}
