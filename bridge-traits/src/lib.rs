//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the dispatch core and the
//! application it runs inside. Each trait represents a capability that the core
//! requires but that the host implements differently per platform.
//!
//! ## Traits
//!
//! ### Execution
//! - [`Executor`](executor::Executor) - Anything that accepts work (pools, serial queues, runtimes)
//! - [`PrivilegedHost`](executor::PrivilegedHost) - The application's main/UI loop: thread identity and pumping
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Other    | Host-provided       | 📋 Inject via `install_privileged_host` |
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so the core can call them
//! from any thread. Implementations must ensure thread safety.
//!
//! ## Examples
//!
//! ### Implementing PrivilegedHost
//!
//! ```ignore
//! use bridge_traits::executor::{Executor, PrivilegedHost, Work};
//! use std::time::Duration;
//!
//! struct MyMainLoop { /* native loop handle */ }
//!
//! impl Executor for MyMainLoop {
//!     fn execute(&self, work: Work) {
//!         // post `work` to the native loop
//!     }
//! }
//!
//! impl PrivilegedHost for MyMainLoop {
//!     fn is_privileged_thread(&self) -> bool { /* native check */ true }
//!     fn pump_once(&self, max_wait: Duration) -> bool { /* run loop until timeout */ false }
//!     fn wake(&self) { /* post an empty event */ }
//! }
//! ```

pub mod error;
pub mod executor;
pub mod logging;
pub mod platform;

pub use error::BridgeError;

// Re-export commonly used types
pub use executor::{Executor, PrivilegedHost, Work};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
