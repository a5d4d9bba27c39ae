//! Turning callback-style operations into blocking calls.
//!
//! An *operation* is a closure that receives a single-use [`Callback`] and
//! arranges for it to be called, exactly once, with the result, from any
//! thread and at any later time. The functions here run the operation on a
//! chosen [`ExecutionContext`] and block the caller until the callback fires,
//! then hand back the delivered value.
//!
//! ```
//! use core_dispatch::{on_background, on_current};
//!
//! // A callback-style API.
//! fn lookup(key: u32, done: impl FnOnce(String) + Send + 'static) {
//!     std::thread::spawn(move || done(format!("value-{}", key)));
//! }
//!
//! let value = on_background(|done| lookup(7, done));
//! assert_eq!(value, "value-7");
//!
//! let value = on_current(|done| done(1 + 1));
//! assert_eq!(value, 2);
//! ```
//!
//! # Contract
//!
//! - The operation must call its callback eventually. If it never does, the
//!   caller waits forever; there is no timeout and no cancellation.
//! - The callback is `FnOnce`, so it cannot be called twice.
//! - Waiting on the privileged thread keeps that context's queue running, so
//!   an operation may schedule more privileged work and wait for it.
//! - Waiting on any other serial context for work queued behind the caller on
//!   that same context deadlocks, as it would with any blocking wait.

use std::sync::Arc;

use tracing::{debug_span, trace, Span};

use crate::context::ExecutionContext;
use crate::gate::{Gate, GateSignal, PendingResult};

/// Single-use completion callback handed to an operation.
pub type Callback<O> = Box<dyn FnOnce(O) + Send + 'static>;

/// Run `operation` on `context` and block until its callback fires.
///
/// The wait strategy follows the *calling* thread: on the privileged thread
/// the wait pumps the privileged context, elsewhere it parks. For
/// [`ExecutionContext::current`] the operation runs synchronously before the
/// wait starts.
pub fn run_and_wait<O, F>(context: &ExecutionContext, operation: F) -> O
where
    O: Send + 'static,
    F: FnOnce(Callback<O>) + Send + 'static,
{
    if context.is_current() {
        return on_current(operation);
    }

    let (gate, signal) = Gate::new();
    let pending = Arc::new(PendingResult::new());
    let callback = completion(Arc::clone(&pending), signal);

    let span = wait_span(context, &gate);
    let _entered = span.enter();

    trace!("Submitting operation");
    context.submit(move || operation(callback));
    gate.wait();

    take_delivered(&pending)
}

/// Run `operation` on the calling thread and block until its callback fires.
///
/// The operation runs to its return before the wait begins, so it may borrow
/// from the caller and need not be `Send`. Only the callback crosses threads.
pub fn on_current<O, F>(operation: F) -> O
where
    O: Send + 'static,
    F: FnOnce(Callback<O>),
{
    let (gate, signal) = Gate::new();
    let pending = Arc::new(PendingResult::new());
    let callback = completion(Arc::clone(&pending), signal);

    let span = wait_span(&ExecutionContext::current(), &gate);
    let _entered = span.enter();

    operation(callback);
    gate.wait();

    take_delivered(&pending)
}

/// [`run_and_wait`] on the shared background pool.
pub fn on_background<O, F>(operation: F) -> O
where
    O: Send + 'static,
    F: FnOnce(Callback<O>) + Send + 'static,
{
    run_and_wait(&ExecutionContext::background(), operation)
}

/// [`run_and_wait`] on the privileged context.
pub fn on_privileged<O, F>(operation: F) -> O
where
    O: Send + 'static,
    F: FnOnce(Callback<O>) + Send + 'static,
{
    run_and_wait(&ExecutionContext::privileged(), operation)
}

/// [`run_and_wait`] on a caller-chosen context.
pub fn on_context<O, F>(context: &ExecutionContext, operation: F) -> O
where
    O: Send + 'static,
    F: FnOnce(Callback<O>) + Send + 'static,
{
    run_and_wait(context, operation)
}

fn wait_span(context: &ExecutionContext, gate: &Gate) -> Span {
    debug_span!("run_and_wait", context = %context, mode = ?gate.mode())
}

fn completion<O>(pending: Arc<PendingResult<O>>, signal: GateSignal) -> Callback<O>
where
    O: Send + 'static,
{
    Box::new(move |value| {
        pending.fulfill(value);
        signal.signal();
    })
}

fn take_delivered<O>(pending: &PendingResult<O>) -> O {
    match pending.take() {
        Some(value) => value,
        // Only the callback opens the gate, and it fills the slot first.
        None => unreachable!("gate opened without a delivered value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::SerialQueue;
    use parking_lot::Mutex;
    use std::fmt;
    use std::thread;
    use std::time::{Duration, Instant};
    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id};
    use tracing::Subscriber;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Records how each `run_and_wait` span's `context` field was written.
    #[derive(Clone, Default)]
    struct SpanFields {
        contexts: Arc<Mutex<Vec<String>>>,
    }

    struct ContextField(Option<String>);

    impl Visit for ContextField {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "context" {
                self.0 = Some(format!("str:{}", value));
            }
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "context" {
                self.0 = Some(format!("display:{:?}", value));
            }
        }
    }

    impl<S: Subscriber> Layer<S> for SpanFields {
        fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
            if attrs.metadata().name() != "run_and_wait" {
                return;
            }
            let mut visitor = ContextField(None);
            attrs.record(&mut visitor);
            if let Some(value) = visitor.0 {
                self.contexts.lock().push(value);
            }
        }
    }

    #[test]
    fn test_wait_spans_render_context_the_same_way() {
        let fields = SpanFields::default();
        let subscriber = tracing_subscriber::registry().with(fields.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        on_current(|done| done(()));
        let queue = Arc::new(SerialQueue::new("bridge-unit-span").unwrap());
        run_and_wait(&ExecutionContext::named("bridge-unit-span", queue), |done| done(()));

        assert_eq!(
            *fields.contexts.lock(),
            vec!["display:current", "display:bridge-unit-span"]
        );
    }

    #[test]
    fn test_current_with_synchronous_callback() {
        let value = on_current(|done| done("inline"));
        assert_eq!(value, "inline");
    }

    #[test]
    fn test_current_may_borrow_from_caller() {
        let words = vec!["a", "b", "c"];
        let joined = on_current(|done| done(words.join("-")));
        assert_eq!(joined, "a-b-c");
        assert_eq!(words.len(), 3);
    }

    #[test]
    fn test_current_waits_for_late_callback() {
        let start = Instant::now();
        let value = run_and_wait(&ExecutionContext::current(), |done| {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(40));
                done(9u8);
            });
        });

        assert_eq!(value, 9);
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_named_serial_queue_runs_operation_there() {
        let queue = Arc::new(SerialQueue::new("bridge-unit-queue").unwrap());
        let ctx = ExecutionContext::named("bridge-unit-queue", queue.clone());

        let observer = Arc::clone(&queue);
        let ran_on_queue = on_context(&ctx, move |done| done(observer.is_current()));
        assert!(ran_on_queue);
    }

    #[test]
    fn test_callback_from_different_context() {
        let queue = Arc::new(SerialQueue::new("bridge-unit-hop").unwrap());
        let ctx = ExecutionContext::named("bridge-unit-hop", queue);

        // Operation starts on the queue, completes from an unrelated thread.
        let value = on_context(&ctx, |done| {
            thread::spawn(move || done(String::from("hopped")));
        });
        assert_eq!(value, "hopped");
    }
}
