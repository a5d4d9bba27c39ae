//! Execution contexts: where bridged work runs.
//!
//! An [`ExecutionContext`] is a cheap, comparable handle. Three of them are
//! process-wide singletons (`current`, `background`, `privileged`); the fourth
//! kind wraps any [`Executor`] the caller owns.
//!
//! ```
//! use core_dispatch::ExecutionContext;
//!
//! let ctx = ExecutionContext::background();
//! assert_eq!(ctx, ExecutionContext::background());
//! assert!(!ctx.is_privileged());
//! ```

use std::fmt;
use std::sync::Arc;

use bridge_traits::executor::Executor;

use crate::host;

/// A caller-supplied executor with a label for diagnostics.
///
/// Two named contexts are equal when they wrap the same executor instance;
/// labels play no part in identity.
#[derive(Clone)]
pub struct NamedContext {
    label: Arc<str>,
    executor: Arc<dyn Executor>,
}

impl NamedContext {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    fn identity(&self) -> *const () {
        Arc::as_ptr(&self.executor) as *const ()
    }
}

impl PartialEq for NamedContext {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for NamedContext {}

#[derive(Clone, PartialEq, Eq)]
enum Kind {
    Current,
    Background,
    Privileged,
    Named(NamedContext),
}

/// Where an operation runs.
#[derive(Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    kind: Kind,
}

impl ExecutionContext {
    /// Whatever thread is calling. Work submitted here runs inline.
    pub fn current() -> Self {
        Self {
            kind: Kind::Current,
        }
    }

    /// The shared, unbounded, concurrent background pool.
    pub fn background() -> Self {
        Self {
            kind: Kind::Background,
        }
    }

    /// The application's single privileged (main/UI) context.
    pub fn privileged() -> Self {
        Self {
            kind: Kind::Privileged,
        }
    }

    /// Any executor the caller owns, serial or concurrent.
    pub fn named(label: impl Into<String>, executor: Arc<dyn Executor>) -> Self {
        let label: String = label.into();
        Self {
            kind: Kind::Named(NamedContext {
                label: label.into(),
                executor,
            }),
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self.kind, Kind::Privileged)
    }

    pub fn is_current(&self) -> bool {
        matches!(self.kind, Kind::Current)
    }

    pub fn as_named(&self) -> Option<&NamedContext> {
        match &self.kind {
            Kind::Named(named) => Some(named),
            _ => None,
        }
    }

    pub fn label(&self) -> &str {
        match &self.kind {
            Kind::Current => "current",
            Kind::Background => "background",
            Kind::Privileged => "privileged",
            Kind::Named(named) => named.label(),
        }
    }

    /// Schedule `work` on this context without waiting for it.
    ///
    /// The current context runs `work` before returning. Every other context
    /// returns immediately; serialized ones (the privileged context and
    /// serial named executors) run work from one submitting thread in order.
    ///
    /// # Panics
    ///
    /// The first submission to the background or privileged context panics if
    /// that singleton cannot be started (see [`host::try_background_pool`]
    /// and [`host::try_privileged_host`]).
    pub fn submit<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.kind {
            Kind::Current => work(),
            Kind::Background => host::background_pool().execute(work),
            Kind::Privileged => host::privileged_host().execute(Box::new(work)),
            Kind::Named(named) => named.executor.execute(Box::new(work)),
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Named(named) => f
                .debug_tuple("ExecutionContext::Named")
                .field(&named.label())
                .finish(),
            _ => write!(f, "ExecutionContext::{}", self.label()),
        }
    }
}
