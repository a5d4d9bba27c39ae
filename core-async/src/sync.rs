//! Synchronization primitives re-exported from `tokio::sync`.
//!
//! The unbounded `mpsc` channel doubles as a plain work queue for dedicated
//! threads: `blocking_recv` is fine there because no runtime drives them.

pub use tokio::sync::mpsc;
