//! Shared worker pool.
//!
//! A [`WorkerPool`] owns a multi-threaded Tokio runtime and hands blocking
//! closures to that runtime's blocking thread pool. The blocking pool grows on
//! demand up to `max_threads`, which makes it a good fit for callback-style
//! work that may park its thread: a parked worker never starves the async
//! workers that drive timers and I/O for the same pool.
//!
//! Closures run on threads that have the pool's runtime entered, so they can
//! call [`crate::task::spawn`] or [`crate::runtime::current_handle`] to hop onto
//! the async side.

use std::io;

use tracing::debug;

use crate::runtime::{Builder, Handle, Runtime};

const DEFAULT_MAX_THREADS: usize = 512;
const DEFAULT_THREAD_NAME: &str = "core-async-pool";

/// Builder for [`WorkerPool`].
#[derive(Debug, Clone)]
pub struct WorkerPoolBuilder {
    max_threads: usize,
    async_threads: Option<usize>,
    thread_name: String,
}

impl Default for WorkerPoolBuilder {
    fn default() -> Self {
        Self {
            max_threads: DEFAULT_MAX_THREADS,
            async_threads: None,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl WorkerPoolBuilder {
    /// Upper bound on concurrently running blocking closures.
    ///
    /// Values below 1 are clamped to 1.
    pub fn max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads.max(1);
        self
    }

    /// Number of async worker threads. Defaults to the number of CPUs.
    pub fn async_threads(mut self, threads: usize) -> Self {
        self.async_threads = Some(threads.max(1));
        self
    }

    /// Name given to every thread the pool starts.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Starts the pool's runtime.
    ///
    /// # Errors
    ///
    /// Returns the I/O error reported by Tokio when the runtime's threads or
    /// drivers cannot be created.
    pub fn build(self) -> io::Result<WorkerPool> {
        let mut builder = Builder::new_multi_thread();
        builder
            .enable_all()
            .max_blocking_threads(self.max_threads)
            .thread_name(self.thread_name.clone());
        if let Some(threads) = self.async_threads {
            builder.worker_threads(threads);
        }

        let runtime = builder.build()?;
        debug!(
            thread_name = %self.thread_name,
            max_threads = self.max_threads,
            "Worker pool started"
        );

        Ok(WorkerPool {
            runtime,
            max_threads: self.max_threads,
            thread_name: self.thread_name,
        })
    }
}

/// A concurrent pool of worker threads.
pub struct WorkerPool {
    runtime: Runtime,
    max_threads: usize,
    thread_name: String,
}

impl WorkerPool {
    pub fn builder() -> WorkerPoolBuilder {
        WorkerPoolBuilder::default()
    }

    /// Schedules `work` on a pool thread and returns immediately.
    ///
    /// There is no ordering between closures; two submissions may run
    /// concurrently. A panic inside `work` is captured by the runtime and
    /// discarded together with the task's join handle.
    pub fn execute<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        drop(self.runtime.spawn_blocking(work));
    }

    /// Handle to the pool's runtime, for spawning async tasks onto it.
    pub fn handle(&self) -> &Handle {
        self.runtime.handle()
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("max_threads", &self.max_threads)
            .field("thread_name", &self.thread_name)
            .finish_non_exhaustive()
    }
}
