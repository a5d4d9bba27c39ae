//! Task spawning and execution abstractions.
//!
//! Thin re-exports of Tokio's task API. `spawn` requires an ambient runtime;
//! use [`WorkerPool::handle`](crate::pool::WorkerPool::handle) when the caller
//! is not already on one.
//!
//! # Examples
//!
//! ```rust
//! use core_async::{runtime, task};
//!
//! runtime::block_on(async {
//!     let handle = task::spawn(async { 42 });
//!     assert_eq!(handle.await.unwrap(), 42);
//! });
//! ```

pub use tokio::task::{spawn_blocking, JoinError, JoinHandle};

/// Spawns a new asynchronous task on the current Tokio runtime.
///
/// # Panics
///
/// Panics when called outside of a runtime context.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}
