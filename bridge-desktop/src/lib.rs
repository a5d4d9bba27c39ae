//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `PrivilegedHost` as [`EventLoop`]: a FIFO work loop owned by one thread,
//!   either adopted (`run`) or dedicated (`spawn`)
//! - `Executor` as [`SerialQueue`]: a labelled FIFO queue on its own thread
//!
//! Desktop applications that already have a native main loop should wrap it
//! in their own `PrivilegedHost` instead of using [`EventLoop`].
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{EventLoop, SerialQueue};
//!
//! fn main() -> anyhow::Result<()> {
//!     let main_loop = EventLoop::new("main");
//!     core_dispatch::install_privileged_host(main_loop.clone())?;
//!
//!     let io_queue = SerialQueue::new("io")?;
//!     // ... hand `io_queue` to ExecutionContext::named
//!
//!     main_loop.run()?;
//!     Ok(())
//! }
//! ```

mod event_loop;
mod serial_queue;

pub use event_loop::EventLoop;
pub use serial_queue::SerialQueue;
