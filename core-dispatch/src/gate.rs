//! One-shot gate between a bridged callback and the thread waiting on it.
//!
//! A [`Gate`] opens exactly once. How its owner waits depends on the thread
//! that created it, decided once at construction:
//!
//! - On the privileged thread the gate waits **cooperatively**: it keeps
//!   driving the privileged host one bounded step at a time, so work queued on
//!   that context (including work the awaited operation itself needs) keeps
//!   running.
//! - Anywhere else it **blocks** the thread on a latch until signalled.
//!
//! The waiting half is `!Send`, so a cooperative gate can only be waited on by
//! the privileged thread that created it. The signalling half is consumed by
//! [`GateSignal::signal`], so a gate cannot be signalled twice.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::executor::PrivilegedHost;
use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::host;

/// How a [`Gate`] waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Pump the privileged host until the gate opens.
    CooperativePoll,
    /// Park the thread until the gate opens.
    BlockingWait,
}

struct GateState {
    finished: AtomicBool,
    latch: Mutex<()>,
    opened: Condvar,
    /// Set for cooperative gates so signalling can cut a pump step short.
    waker: Option<Arc<dyn PrivilegedHost>>,
}

enum Waiter {
    Cooperative {
        host: Arc<dyn PrivilegedHost>,
        pump_interval: Duration,
    },
    Blocking,
}

/// Waiting half of a gate.
pub struct Gate {
    state: Arc<GateState>,
    waiter: Waiter,
    _not_send: PhantomData<*const ()>,
}

/// Signalling half of a gate. May move to any thread.
pub struct GateSignal {
    state: Arc<GateState>,
}

impl Gate {
    /// Create a gate for the calling thread using the process-wide host and
    /// pump interval.
    pub fn new() -> (Gate, GateSignal) {
        match host::installed_privileged_host() {
            Some(privileged) => {
                Self::for_host(Arc::clone(privileged), host::config().pump_interval())
            }
            None => Self::blocking(),
        }
    }

    /// Create a gate that waits cooperatively on `privileged` when the calling
    /// thread is that host's thread, and blocks otherwise.
    pub fn for_host(privileged: Arc<dyn PrivilegedHost>, pump_interval: Duration) -> (Gate, GateSignal) {
        if privileged.is_privileged_thread() {
            let state = Arc::new(GateState::new(Some(Arc::clone(&privileged))));
            let waiter = Waiter::Cooperative {
                host: privileged,
                pump_interval,
            };
            Self::from_parts(state, waiter)
        } else {
            Self::blocking()
        }
    }

    /// Create a gate that always blocks.
    pub fn blocking() -> (Gate, GateSignal) {
        Self::from_parts(Arc::new(GateState::new(None)), Waiter::Blocking)
    }

    fn from_parts(state: Arc<GateState>, waiter: Waiter) -> (Gate, GateSignal) {
        let signal = GateSignal {
            state: Arc::clone(&state),
        };
        let gate = Gate {
            state,
            waiter,
            _not_send: PhantomData,
        };
        (gate, signal)
    }

    pub fn mode(&self) -> GateMode {
        match self.waiter {
            Waiter::Cooperative { .. } => GateMode::CooperativePoll,
            Waiter::Blocking => GateMode::BlockingWait,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    /// Wait until the gate has been signalled.
    ///
    /// Everything the signalling thread wrote before calling
    /// [`GateSignal::signal`] is visible once this returns. There is no
    /// timeout: a gate that is never signalled never returns.
    pub fn wait(self) {
        match &self.waiter {
            Waiter::Cooperative {
                host,
                pump_interval,
            } => {
                let mut steps = 0u64;
                while !self.is_finished() {
                    host.pump_once(*pump_interval);
                    steps += 1;
                }
                trace!(steps, "Cooperative gate opened");
            }
            Waiter::Blocking => {
                let mut latch = self.state.latch.lock();
                while !self.is_finished() {
                    self.state.opened.wait(&mut latch);
                }
                trace!("Blocking gate opened");
            }
        }
    }
}

impl GateState {
    fn new(waker: Option<Arc<dyn PrivilegedHost>>) -> Self {
        Self {
            finished: AtomicBool::new(false),
            latch: Mutex::new(()),
            opened: Condvar::new(),
            waker,
        }
    }
}

impl GateSignal {
    /// Open the gate and wake its waiter.
    pub fn signal(self) {
        {
            let _latch = self.state.latch.lock();
            self.state.finished.store(true, Ordering::Release);
        }
        self.state.opened.notify_all();
        if let Some(host) = &self.state.waker {
            host.wake();
        }
    }
}

/// Single-slot holder for the value a callback delivers.
///
/// Written once by the callback, taken once by the waiter after the gate
/// opens.
pub struct PendingResult<O> {
    slot: Mutex<Option<O>>,
}

impl<O> PendingResult<O> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn fulfill(&self, value: O) {
        *self.slot.lock() = Some(value);
    }

    pub fn take(&self) -> Option<O> {
        self.slot.lock().take()
    }
}

impl<O> Default for PendingResult<O> {
    fn default() -> Self {
        Self::new()
    }
}
