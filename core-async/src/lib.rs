//! Runtime abstraction layer for syncbridge.
//!
//! Every other crate in the workspace reaches Tokio through this crate so the
//! executor choice lives in exactly one place.
//!
//! # Modules
//!
//! - `runtime`: Runtime handles and a one-off `block_on`
//! - `pool`: The worker pool that backs the shared background context
//! - `task`: Task spawning on the ambient runtime
//! - `time`: Sleep, duration and instant
//! - `sync`: Async channels and locks
//!
//! # Examples
//!
//! ```rust
//! use core_async::pool::WorkerPool;
//! use std::sync::mpsc;
//!
//! let pool = WorkerPool::builder().max_threads(4).build().unwrap();
//! let (tx, rx) = mpsc::channel();
//! pool.execute(move || tx.send(7).unwrap());
//! assert_eq!(rx.recv().unwrap(), 7);
//! ```

pub mod pool;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use pool::WorkerPool;
pub use task::spawn;
pub use time::{sleep, Duration, Instant};
