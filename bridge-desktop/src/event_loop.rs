//! Desktop Privileged Event Loop
//!
//! A single-threaded work loop that plays the role of the application's
//! main/UI loop on desktop. Work submitted to it runs in FIFO order on one
//! owner thread; delayed work becomes ready at its due time and joins the
//! queue behind anything already queued.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use bridge_traits::{
    error::{BridgeError, Result},
    executor::{Executor, PrivilegedHost, Work},
};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

/// Wait used by [`EventLoop::run`] between idle checks.
const IDLE_WAIT: Duration = Duration::from_secs(1);

struct DelayedWork {
    due: Instant,
    seq: u64,
    work: Work,
}

impl PartialEq for DelayedWork {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for DelayedWork {}

impl PartialOrd for DelayedWork {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedWork {
    // Reversed so the max-heap pops the earliest deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

enum Step {
    Run(Work),
    Idle,
    Quit,
}

#[derive(Default)]
struct LoopState {
    queue: VecDeque<Work>,
    delayed: BinaryHeap<DelayedWork>,
    next_seq: u64,
    woken: bool,
    quit: bool,
}

impl LoopState {
    fn promote_due(&mut self, now: Instant) {
        while self.delayed.peek().is_some_and(|d| d.due <= now) {
            if let Some(delayed) = self.delayed.pop() {
                self.queue.push_back(delayed.work);
            }
        }
    }

    fn next_due(&self) -> Option<Instant> {
        self.delayed.peek().map(|d| d.due)
    }
}

/// Desktop implementation of [`PrivilegedHost`].
///
/// Either adopt an existing thread with [`run`](EventLoop::run) (typically the
/// process's main thread) or start a dedicated one with
/// [`spawn`](EventLoop::spawn). The first thread to run or pump the loop
/// becomes its owner for good.
pub struct EventLoop {
    name: String,
    owner: OnceLock<ThreadId>,
    state: Mutex<LoopState>,
    ready: Condvar,
}

impl EventLoop {
    /// Create a loop with no owner thread yet.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            owner: OnceLock::new(),
            state: Mutex::new(LoopState::default()),
            ready: Condvar::new(),
        })
    }

    /// Create a loop and run it on a new thread named `name`.
    ///
    /// The call returns once the new thread owns the loop, so
    /// [`is_privileged_thread`](PrivilegedHost::is_privileged_thread) is
    /// already accurate for it.
    pub fn spawn(name: impl Into<String>) -> Result<Arc<Self>> {
        let event_loop = Self::new(name);
        let runner = Arc::clone(&event_loop);
        let (bound_tx, bound_rx) = std::sync::mpsc::channel();

        thread::Builder::new()
            .name(event_loop.name.clone())
            .spawn(move || {
                let bound = runner.bind_current_thread();
                let failed = bound.is_err();
                let _ = bound_tx.send(bound);
                if failed {
                    return;
                }
                runner.run_bound();
            })?;

        bound_rx.recv().map_err(|_| BridgeError::ThreadExited {
            name: event_loop.name.clone(),
        })??;

        debug!(name = %event_loop.name, "Event loop thread started");
        Ok(event_loop)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Make the calling thread the owner of this loop.
    ///
    /// Succeeds again on the owner thread; fails on any other thread once an
    /// owner has been bound.
    pub fn bind_current_thread(&self) -> Result<()> {
        let current = thread::current().id();
        let owner = *self.owner.get_or_init(|| current);
        if owner == current {
            Ok(())
        } else {
            Err(BridgeError::AlreadyOwned {
                name: self.name.clone(),
            })
        }
    }

    /// Run the loop on the calling thread until [`quit`](EventLoop::quit).
    ///
    /// # Errors
    ///
    /// Fails without running anything if another thread owns the loop.
    pub fn run(&self) -> Result<()> {
        self.bind_current_thread()?;
        self.run_bound();
        Ok(())
    }

    fn run_bound(&self) {
        debug!(name = %self.name, "Event loop running");
        loop {
            match self.next_step(IDLE_WAIT, true) {
                Step::Run(work) => {
                    trace!(name = %self.name, "Running event loop work item");
                    work();
                }
                Step::Idle => {}
                Step::Quit => break,
            }
        }
        debug!(name = %self.name, "Event loop stopped");
    }

    /// Ask [`run`](EventLoop::run) to return after the current work item.
    ///
    /// Work still queued stays queued and is dropped with the loop. Explicit
    /// [`pump_once`](PrivilegedHost::pump_once) calls keep working, and keep
    /// waiting out their `max_wait`, so a cooperative wait in progress on the
    /// owner thread still completes.
    pub fn quit(&self) {
        self.state.lock().quit = true;
        self.ready.notify_all();
    }

    /// Enqueue `work` behind everything already queued.
    pub fn submit<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(Box::new(work));
    }

    /// Enqueue `work` once `delay` has elapsed.
    pub fn schedule_after<F>(&self, delay: Duration, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let due = Instant::now() + delay;
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.delayed.push(DelayedWork {
            due,
            seq,
            work: Box::new(work),
        });
        drop(state);
        self.ready.notify_all();
    }

    /// Number of queued items, delayed ones included.
    pub fn pending(&self) -> usize {
        let state = self.state.lock();
        state.queue.len() + state.delayed.len()
    }

    fn push(&self, work: Work) {
        self.state.lock().queue.push_back(work);
        self.ready.notify_all();
    }

    /// Wait up to `max_wait` for the next ready item.
    ///
    /// Only a [`wake`](PrivilegedHost::wake) or the deadline ends an idle
    /// wait early. `quit` does so too when `stop_on_quit` is set, which only
    /// [`run`](EventLoop::run) asks for.
    fn next_step(&self, max_wait: Duration, stop_on_quit: bool) -> Step {
        let deadline = Instant::now().checked_add(max_wait);
        let mut state = self.state.lock();

        loop {
            if stop_on_quit && state.quit {
                return Step::Quit;
            }
            let now = Instant::now();
            state.promote_due(now);
            if let Some(work) = state.queue.pop_front() {
                return Step::Run(work);
            }
            if state.woken {
                state.woken = false;
                return Step::Idle;
            }
            if deadline.is_some_and(|d| now >= d) {
                return Step::Idle;
            }

            let wake_at = match (deadline, state.next_due()) {
                (Some(d), Some(t)) => Some(d.min(t)),
                (d, t) => d.or(t),
            };
            match wake_at {
                Some(at) => {
                    self.ready.wait_until(&mut state, at);
                }
                None => self.ready.wait(&mut state),
            }
        }
    }
}

impl Executor for EventLoop {
    fn execute(&self, work: Work) {
        self.push(work);
    }
}

impl PrivilegedHost for EventLoop {
    fn is_privileged_thread(&self) -> bool {
        self.owner.get() == Some(&thread::current().id())
    }

    fn pump_once(&self, max_wait: Duration) -> bool {
        if !self.is_privileged_thread() {
            warn!(name = %self.name, "pump_once called off the event loop thread; ignoring");
            return false;
        }

        // The lock is released before the work runs so the work may submit
        // more work or pump the loop again.
        match self.next_step(max_wait, false) {
            Step::Run(work) => {
                trace!(name = %self.name, "Running event loop work item");
                work();
                true
            }
            Step::Idle | Step::Quit => false,
        }
    }

    fn wake(&self) {
        self.state.lock().woken = true;
        self.ready.notify_all();
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("name", &self.name)
            .field("owner", &self.owner.get())
            .finish_non_exhaustive()
    }
}
