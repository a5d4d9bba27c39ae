//! Runtime utilities that abstract over the underlying async executor.
//!
//! We wrap Tokio's runtime primitives so that downstream crates never need to
//! depend on Tokio directly.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion using a lightweight runtime.
///
/// Must not be called from inside another runtime's worker thread.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}

/// Returns the handle of the runtime driving the current thread, if any.
///
/// Threads of a [`WorkerPool`](crate::pool::WorkerPool) always have one, which
/// lets blocking work hop back onto the async side of the same pool.
pub fn current_handle() -> Option<Handle> {
    Handle::try_current().ok()
}
