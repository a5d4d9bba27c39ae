//! # Bridge Configuration Module
//!
//! Process-wide settings for the dispatch layer.
//!
//! ## Overview
//!
//! The privileged host and the shared worker pool are created lazily, once,
//! on first use. [`BridgeConfig`] carries the knobs that shape them and the
//! cooperative wait on the privileged thread. It is built with a validating
//! builder, can be deserialized from a settings file, and can be overridden
//! from the environment.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::BridgeConfig;
//! use std::time::Duration;
//!
//! let config = BridgeConfig::builder()
//!     .pump_interval(Duration::from_millis(50))
//!     .pool_max_threads(64)
//!     .build()
//!     .expect("valid configuration");
//!
//! assert_eq!(config.pump_interval(), Duration::from_millis(50));
//! ```
//!
//! ## Environment overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SYNCBRIDGE_PUMP_INTERVAL_MS` | `pump_interval_ms` |
//! | `SYNCBRIDGE_POOL_MAX_THREADS` | `pool_max_threads` |
//! | `SYNCBRIDGE_POOL_THREAD_NAME` | `pool_thread_name` |
//! | `SYNCBRIDGE_PRIVILEGED_THREAD_NAME` | `privileged_thread_name` |
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::BridgeConfig;
//!
//! // A zero pump interval would spin the privileged thread.
//! let config = BridgeConfig::builder()
//!     .pump_interval_ms(0)
//!     .build()
//!     .expect("Should fail - pump interval must be positive");
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_PUMP_INTERVAL_MS: &str = "SYNCBRIDGE_PUMP_INTERVAL_MS";
pub const ENV_POOL_MAX_THREADS: &str = "SYNCBRIDGE_POOL_MAX_THREADS";
pub const ENV_POOL_THREAD_NAME: &str = "SYNCBRIDGE_POOL_THREAD_NAME";
pub const ENV_PRIVILEGED_THREAD_NAME: &str = "SYNCBRIDGE_PRIVILEGED_THREAD_NAME";

const DEFAULT_PUMP_INTERVAL_MS: u64 = 100;
const MAX_PUMP_INTERVAL_MS: u64 = 10_000;
const DEFAULT_POOL_MAX_THREADS: usize = 512;
const MAX_POOL_THREADS: usize = 32_768;
const DEFAULT_POOL_THREAD_NAME: &str = "syncbridge-pool";
const DEFAULT_PRIVILEGED_THREAD_NAME: &str = "syncbridge-main";

/// Settings for the dispatch singletons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Upper bound of one cooperative pump step on the privileged thread.
    pub pump_interval_ms: u64,

    /// Maximum number of concurrently running background closures.
    pub pool_max_threads: usize,

    /// Thread name for background pool workers.
    pub pool_thread_name: String,

    /// Thread name for the default privileged event loop, when the
    /// application does not install its own host.
    pub privileged_thread_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            pump_interval_ms: DEFAULT_PUMP_INTERVAL_MS,
            pool_max_threads: DEFAULT_POOL_MAX_THREADS,
            pool_thread_name: DEFAULT_POOL_THREAD_NAME.to_string(),
            privileged_thread_name: DEFAULT_PRIVILEGED_THREAD_NAME.to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms)
    }

    /// Defaults overlaid with whatever the process environment sets.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by environment variable name, then validate.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_PUMP_INTERVAL_MS) {
            self.pump_interval_ms = parse_number(ENV_PUMP_INTERVAL_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_POOL_MAX_THREADS) {
            self.pool_max_threads = parse_number(ENV_POOL_MAX_THREADS, &raw)?;
        }
        if let Some(name) = lookup(ENV_POOL_THREAD_NAME) {
            self.pool_thread_name = name;
        }
        if let Some(name) = lookup(ENV_PRIVILEGED_THREAD_NAME) {
            self.privileged_thread_name = name;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Pump interval is positive and at most 10 seconds
    /// - Pool size is between 1 and 32,768 threads
    /// - Thread names are non-empty and contain no NUL byte
    pub fn validate(&self) -> Result<()> {
        if self.pump_interval_ms == 0 {
            return Err(Error::Config(
                "Pump interval must be greater than 0ms".to_string(),
            ));
        }

        if self.pump_interval_ms > MAX_PUMP_INTERVAL_MS {
            return Err(Error::Config(
                "Pump interval exceeds maximum of 10 seconds (10,000ms); \
                 the privileged thread would stall between checks"
                    .to_string(),
            ));
        }

        if self.pool_max_threads == 0 {
            return Err(Error::Config(
                "Background pool needs at least 1 thread".to_string(),
            ));
        }

        if self.pool_max_threads > MAX_POOL_THREADS {
            return Err(Error::Config(format!(
                "Background pool size exceeds maximum of {} threads",
                MAX_POOL_THREADS
            )));
        }

        validate_thread_name("pool_thread_name", &self.pool_thread_name)?;
        validate_thread_name("privileged_thread_name", &self.privileged_thread_name)?;

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a positive integer, got '{}'", key, raw)))
}

fn validate_thread_name(field: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Config(format!("{} cannot be empty", field)));
    }
    if name.contains('\0') {
        return Err(Error::Config(format!("{} cannot contain NUL bytes", field)));
    }
    Ok(())
}

/// Builder for constructing [`BridgeConfig`] instances.
///
/// Unset fields keep their defaults; [`build()`](BridgeConfigBuilder::build)
/// validates the result.
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    pump_interval_ms: Option<u64>,
    pool_max_threads: Option<usize>,
    pool_thread_name: Option<String>,
    privileged_thread_name: Option<String>,
}

impl BridgeConfigBuilder {
    /// Sets the cooperative pump step.
    ///
    /// Default: 100 ms. Sub-millisecond parts are truncated.
    pub fn pump_interval(mut self, interval: Duration) -> Self {
        self.pump_interval_ms = Some(interval.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    pub fn pump_interval_ms(mut self, millis: u64) -> Self {
        self.pump_interval_ms = Some(millis);
        self
    }

    /// Sets the background pool's thread cap.
    ///
    /// Default: 512
    pub fn pool_max_threads(mut self, threads: usize) -> Self {
        self.pool_max_threads = Some(threads);
        self
    }

    pub fn pool_thread_name(mut self, name: impl Into<String>) -> Self {
        self.pool_thread_name = Some(name.into());
        self
    }

    pub fn privileged_thread_name(mut self, name: impl Into<String>) -> Self {
        self.privileged_thread_name = Some(name.into());
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<BridgeConfig> {
        let defaults = BridgeConfig::default();
        let config = BridgeConfig {
            pump_interval_ms: self.pump_interval_ms.unwrap_or(defaults.pump_interval_ms),
            pool_max_threads: self.pool_max_threads.unwrap_or(defaults.pool_max_threads),
            pool_thread_name: self.pool_thread_name.unwrap_or(defaults.pool_thread_name),
            privileged_thread_name: self
                .privileged_thread_name
                .unwrap_or(defaults.privileged_thread_name),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.pump_interval(), Duration::from_millis(100));
        assert_eq!(config.pool_max_threads, 512);
        assert_eq!(config.pool_thread_name, "syncbridge-pool");
        assert_eq!(config.privileged_thread_name, "syncbridge-main");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides_fields() {
        let config = BridgeConfig::builder()
            .pump_interval(Duration::from_millis(25))
            .pool_max_threads(8)
            .pool_thread_name("workers")
            .privileged_thread_name("ui")
            .build()
            .unwrap();

        assert_eq!(config.pump_interval_ms, 25);
        assert_eq!(config.pool_max_threads, 8);
        assert_eq!(config.pool_thread_name, "workers");
        assert_eq!(config.privileged_thread_name, "ui");
    }

    #[test]
    fn test_builder_rejects_zero_pump_interval() {
        let result = BridgeConfig::builder().pump_interval_ms(0).build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Pump interval must be greater than 0ms"));
    }

    #[test]
    fn test_builder_rejects_long_pump_interval() {
        let result = BridgeConfig::builder()
            .pump_interval(Duration::from_secs(60))
            .build();

        assert!(result.unwrap_err().to_string().contains("10 seconds"));
    }

    #[test]
    fn test_builder_rejects_zero_pool() {
        let result = BridgeConfig::builder().pool_max_threads(0).build();
        assert!(result.unwrap_err().to_string().contains("at least 1 thread"));
    }

    #[test]
    fn test_builder_rejects_empty_thread_name() {
        let result = BridgeConfig::builder().pool_thread_name("  ").build();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("pool_thread_name cannot be empty"));
    }

    #[test]
    fn test_overrides_apply() {
        let config = BridgeConfig::default()
            .with_overrides(lookup_from(&[
                (ENV_PUMP_INTERVAL_MS, "40"),
                (ENV_POOL_MAX_THREADS, " 16 "),
                (ENV_PRIVILEGED_THREAD_NAME, "gui"),
            ]))
            .unwrap();

        assert_eq!(config.pump_interval_ms, 40);
        assert_eq!(config.pool_max_threads, 16);
        assert_eq!(config.pool_thread_name, "syncbridge-pool");
        assert_eq!(config.privileged_thread_name, "gui");
    }

    #[test]
    fn test_overrides_reject_garbage() {
        let result =
            BridgeConfig::default().with_overrides(lookup_from(&[(ENV_POOL_MAX_THREADS, "many")]));

        let message = result.unwrap_err().to_string();
        assert!(message.contains(ENV_POOL_MAX_THREADS));
        assert!(message.contains("many"));
    }

    #[test]
    fn test_overrides_are_validated() {
        let result =
            BridgeConfig::default().with_overrides(lookup_from(&[(ENV_PUMP_INTERVAL_MS, "0")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_deserialize_partial_settings() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{ "pump_interval_ms": 20, "pool_thread_name": "bg" }"#)
                .unwrap();

        assert_eq!(config.pump_interval_ms, 20);
        assert_eq!(config.pool_thread_name, "bg");
        assert_eq!(config.pool_max_threads, 512);
        assert!(config.validate().is_ok());
    }
}
