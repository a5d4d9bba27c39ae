//! Integration tests for logging and configuration

use bridge_traits::logging::LogLevel;
use core_runtime::config::{BridgeConfig, ENV_POOL_THREAD_NAME};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::Error;

#[test]
fn test_logging_initializes_once() {
    // Only one global subscriber per process, so both calls live in one test.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    assert!(init_logging(config.clone()).is_ok());
    tracing::debug!(target: "core_dispatch", "logging is live");

    let second = init_logging(config);
    assert!(matches!(second, Err(Error::AlreadyInitialized(_))));
}

#[test]
fn test_invalid_filter_is_reported_before_init() {
    let config = LoggingConfig::default().with_filter("core_dispatch=loudest");
    let err = init_logging(config).unwrap_err();
    assert!(err.to_string().contains("Invalid log filter"));
}

#[test]
fn test_config_overrides_from_lookup() {
    let config = BridgeConfig::default()
        .with_overrides(|key| (key == ENV_POOL_THREAD_NAME).then(|| "bg-workers".to_string()))
        .unwrap();

    assert_eq!(config.pool_thread_name, "bg-workers");
    assert_eq!(config.pump_interval_ms, 100);
}
