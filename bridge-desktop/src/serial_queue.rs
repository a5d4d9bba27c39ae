//! Dedicated-thread serial queue.

use std::thread::{self, ThreadId};

use bridge_traits::{
    error::Result,
    executor::{Executor, Work},
};
use core_async::sync::mpsc;
use tracing::{debug, warn};

/// A labelled executor that runs work one item at a time, in submission
/// order, on a thread of its own.
///
/// The worker thread exits once the queue is dropped and the remaining work
/// has drained.
pub struct SerialQueue {
    label: String,
    sender: mpsc::UnboundedSender<Work>,
    thread_id: ThreadId,
}

impl SerialQueue {
    /// Start a queue whose worker thread is named `label`.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Work>();

        let worker_label = label.clone();
        let handle = thread::Builder::new().name(label.clone()).spawn(move || {
            while let Some(work) = receiver.blocking_recv() {
                work();
            }
            debug!(queue = %worker_label, "Serial queue drained");
        })?;

        Ok(Self {
            label,
            sender,
            thread_id: handle.thread().id(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the calling thread is this queue's worker.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl Executor for SerialQueue {
    fn execute(&self, work: Work) {
        if self.sender.send(work).is_err() {
            warn!(queue = %self.label, "Serial queue worker has stopped; dropping work");
        }
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    #[test]
    fn test_runs_in_submission_order() {
        let queue = SerialQueue::new("serial-order").unwrap();
        let (tx, rx) = std_mpsc::channel();

        for i in 0..50 {
            let tx = tx.clone();
            queue.execute(Box::new(move || tx.send(i).unwrap()));
        }

        let seen: Vec<_> = (0..50)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_is_current_only_on_worker() {
        let queue = std::sync::Arc::new(SerialQueue::new("serial-current").unwrap());
        assert!(!queue.is_current());

        let (tx, rx) = std_mpsc::channel();
        let observer = std::sync::Arc::clone(&queue);
        queue.execute(Box::new(move || tx.send(observer.is_current()).unwrap()));

        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn test_drop_drains_pending_work() {
        let queue = SerialQueue::new("serial-drop").unwrap();
        let (tx, rx) = std_mpsc::channel();

        queue.execute(Box::new(move || {
            thread::sleep(Duration::from_millis(20));
            tx.send("done").unwrap();
        }));
        drop(queue);

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "done");
    }
}
