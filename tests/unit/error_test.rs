//! Tests for error types

use frameloop::core::RuntimeError;

#[test]
fn test_invalid_config_error() {
    let err = RuntimeError::InvalidConfig("capacity must be greater than 0".to_string());
    assert_eq!(
        format!("{err}"),
        "invalid configuration: capacity must be greater than 0"
    );
}

#[test]
fn test_task_panicked_error() {
    let err = RuntimeError::TaskPanicked("boom".to_string());
    assert_eq!(format!("{err}"), "task panicked: boom");
}

#[test]
fn test_handle_dropped_error() {
    let err = RuntimeError::HandleDropped;
    assert_eq!(format!("{err}"), "task handle dropped before completion");
}

#[test]
fn test_no_runtime_error() {
    assert_eq!(format!("{}", RuntimeError::NoRuntime), "no tokio runtime available");
}

#[test]
fn test_cache_key_error_from_serde() {
    let source = serde_json::from_str::<u32>("not json").unwrap_err();
    let err: RuntimeError = source.into();
    assert!(matches!(err, RuntimeError::CacheKey(_)));
    assert!(format!("{err}").starts_with("cache key error:"));
}

#[test]
fn test_runtime_error_into_anyhow() {
    let err: anyhow::Error = RuntimeError::HandleDropped.into();
    assert!(err.downcast_ref::<RuntimeError>().is_some());
}
