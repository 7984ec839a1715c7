//! Tests for configuration validation

use frameloop::config::{ExecutorConfig, RuntimeConfig, ViewportConfig};

#[test]
fn test_runtime_config_default_validation() {
    assert!(RuntimeConfig::default().validate().is_ok());
}

#[test]
fn test_runtime_config_invalid_concurrency() {
    let cfg = RuntimeConfig {
        executor: ExecutorConfig { concurrency: 0 },
        ..RuntimeConfig::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("executor.concurrency"));
}

#[test]
fn test_viewport_config_rejects_non_finite() {
    let cfg = ViewportConfig {
        item_height: f64::NAN,
        container_height: 100.0,
    };
    assert!(cfg.validate().is_err());

    let cfg = ViewportConfig {
        item_height: 20.0,
        container_height: -1.0,
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_runtime_config_from_json() {
    let json = r#"{
        "executor": { "concurrency": 3 },
        "memo": { "capacity": 2 },
        "ttl": { "ttl_ms": 500 },
        "viewport": { "item_height": 20.0, "container_height": 100.0 },
        "rate_limit": { "debounce_ms": 50 }
    }"#;
    let cfg = RuntimeConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.executor.concurrency, 3);
    assert_eq!(cfg.memo.capacity, 2);
    assert_eq!(cfg.ttl.ttl_ms, 500);
    assert_eq!(cfg.rate_limit.debounce_ms, 50);
    assert_eq!(cfg.rate_limit.throttle_ms, 100);
}

#[test]
fn test_runtime_config_from_json_parse_error() {
    let err = RuntimeConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_runtime_config_serde_roundtrip_keeps_sections() {
    let cfg = RuntimeConfig::default();
    let json = serde_json::to_string(&cfg).unwrap();
    for section in ["executor", "pool", "memo", "ttl", "stats", "viewport", "frame", "rate_limit"] {
        assert!(json.contains(section), "missing section {section}");
    }
}
