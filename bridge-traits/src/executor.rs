//! Execution Contexts
//!
//! Traits for the places where the core schedules work. The core never
//! creates threads for the application's privileged (UI/main) context; it
//! asks the host through [`PrivilegedHost`].

use std::time::Duration;

use core_async::pool::WorkerPool;
use core_async::runtime::Handle;

use crate::platform::PlatformSendSync;

/// A unit of work submitted to an execution context.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run [`Work`] asynchronously.
///
/// # Contract
///
/// - `execute` never blocks the submitter and cannot fail.
/// - Serial executors run work submitted from one thread in submission
///   order. Concurrent executors make no ordering promise.
/// - A panic inside the work is the executor's business: it may be
///   swallowed or may tear down the executing thread, but it is never
///   reported back to the submitter.
pub trait Executor: PlatformSendSync {
    /// Schedule `work` to run later on this executor.
    fn execute(&self, work: Work);
}

/// The application's single privileged context.
///
/// This is the one serialized context that must stay responsive (a UI event
/// loop). Besides accepting work it lets the core ask whether the calling
/// thread is the privileged one, and lets code running *on* that thread drive
/// one bounded step of the loop while it logically waits for something.
///
/// # Platform Notes
///
/// - **Desktop**: `bridge_desktop::EventLoop`
/// - **Other hosts**: wrap the native main loop (a run loop, a looper, a
///   message pump) and forward `pump_once` to its "run until timeout" call
pub trait PrivilegedHost: Executor {
    /// Whether the calling thread is the privileged thread.
    fn is_privileged_thread(&self) -> bool;

    /// Process pending privileged work for at most `max_wait`.
    ///
    /// Must only be called on the privileged thread. Implementations run
    /// whatever became ready (at least one item when available) and return
    /// as soon as they have done so, when `max_wait` elapses, or when
    /// [`wake`](Self::wake) is called, whichever comes first. Returns
    /// whether any work ran.
    fn pump_once(&self, max_wait: Duration) -> bool;

    /// Interrupt a `pump_once` that is waiting for work.
    ///
    /// Callable from any thread. If no pump is waiting, the next one returns
    /// early instead.
    fn wake(&self);
}

impl Executor for Handle {
    fn execute(&self, work: Work) {
        drop(self.spawn_blocking(work));
    }
}

impl Executor for WorkerPool {
    fn execute(&self, work: Work) {
        WorkerPool::execute(self, work);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_worker_pool_is_an_executor() {
        let pool = WorkerPool::builder().max_threads(2).build().unwrap();
        let executor: &dyn Executor = &pool;
        let (tx, rx) = mpsc::channel();

        executor.execute(Box::new(move || tx.send(3).unwrap()));

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 3);
    }

    #[test]
    fn test_runtime_handle_is_an_executor() {
        let pool = WorkerPool::builder().build().unwrap();
        let handle = pool.handle().clone();
        let (tx, rx) = mpsc::channel();

        Executor::execute(&handle, Box::new(move || tx.send("handle").unwrap()));

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "handle");
    }
}
