//! Time-related abstractions backed by `tokio::time`.
//!
//! ```rust
//! use core_async::time::{sleep, Duration, Instant};
//!
//! # async fn example() {
//! let start = Instant::now();
//! sleep(Duration::from_millis(10)).await;
//! assert!(start.elapsed() >= Duration::from_millis(10));
//! # }
//! ```

pub use tokio::time::sleep;

pub use std::time::{Duration, Instant};
