//! # Core Dispatch
//!
//! Blocking bridge over callback-style asynchronous operations.
//!
//! ## Overview
//!
//! Many platform and library APIs report their result through a completion
//! callback. This crate runs such an operation on an execution context of the
//! caller's choosing and blocks until the callback delivers a value:
//!
//! | Selector | Runs the operation on |
//! |----------|-----------------------|
//! | [`on_current`] | the calling thread, synchronously |
//! | [`on_background`] | the shared background pool |
//! | [`on_privileged`] | the application's privileged (main/UI) context |
//! | [`on_context`] | any [`ExecutionContext`], including named executors |
//!
//! The caller's own thread decides how it waits. The privileged thread must
//! keep servicing its queue, so a wait there pumps the privileged host in
//! short steps instead of parking; every other thread parks on a latch.
//!
//! ## Setup
//!
//! ```ignore
//! use bridge_desktop::EventLoop;
//! use core_runtime::config::BridgeConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     core_dispatch::configure(BridgeConfig::builder().pool_max_threads(64).build()?)?;
//!
//!     let main_loop = EventLoop::new("main");
//!     core_dispatch::install_privileged_host(main_loop.clone())?;
//!     main_loop.run()?;
//!     Ok(())
//! }
//! ```
//!
//! Without an installed host the `desktop-shims` feature starts a default
//! [`bridge_desktop::EventLoop`] on a dedicated thread the first time the
//! privileged context is used.

pub mod bridge;
pub mod context;
pub mod gate;
pub mod host;

pub use bridge::{on_background, on_context, on_current, on_privileged, run_and_wait, Callback};
pub use context::{ExecutionContext, NamedContext};
pub use gate::{Gate, GateMode, GateSignal, PendingResult};
pub use host::{configure, current_thread_is_privileged, install_privileged_host};
