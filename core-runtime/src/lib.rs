//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for syncbridge:
//! - Logging and tracing infrastructure
//! - Configuration of the dispatch singletons
//! - The shared error type for setup-time failures
//!
//! ## Overview
//!
//! The bridge itself surfaces no errors; everything that can fail happens
//! while the process wires up logging, configuration and hosts, and fails
//! through [`Error`].

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BridgeConfig, BridgeConfigBuilder};
pub use error::{Error, Result};
