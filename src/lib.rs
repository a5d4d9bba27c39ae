//! Syncbridge facade crate.
//!
//! Re-exports the bridge API from `core-dispatch` together with the
//! configuration and logging setup from `core-runtime`, so host applications
//! can depend on a single crate. The `desktop-shims` feature (on by default)
//! also exposes the desktop event loop and serial queue.

pub use core_dispatch::{
    configure, current_thread_is_privileged, install_privileged_host, on_background, on_context,
    on_current, on_privileged, run_and_wait, Callback, ExecutionContext, NamedContext,
};

pub use core_runtime::config::{BridgeConfig, BridgeConfigBuilder};
pub use core_runtime::error::{Error, Result};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

pub use bridge_traits::executor::{Executor, PrivilegedHost, Work};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{EventLoop, SerialQueue};
