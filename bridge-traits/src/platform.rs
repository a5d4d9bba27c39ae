//! Helper bounds shared by every bridge trait.
//!
//! Hosts hand their implementations to the core behind `Arc<dyn Trait>` and
//! the core calls them from arbitrary threads, so every bridge trait carries
//! `Send + Sync` through this marker instead of repeating the bounds.

/// Marker trait for types that may be shared across threads.
pub trait PlatformSendSync: Send + Sync {}

impl<T> PlatformSendSync for T where T: Send + Sync {}
