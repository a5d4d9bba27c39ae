//! Process-wide dispatch state.
//!
//! Three singletons live here, each created at most once and never torn down:
//! the [`BridgeConfig`], the privileged host and the shared background pool.
//! Configuration is fixed the first time anything reads it; the host and the
//! pool are created on first use unless the application installs its own
//! host beforehand.

use std::sync::{Arc, OnceLock};

use bridge_traits::executor::PrivilegedHost;
use core_async::pool::WorkerPool;
use core_runtime::config::BridgeConfig;
use core_runtime::error::{Error, Result};
use parking_lot::{const_mutex, Mutex};
use tracing::{debug, warn};

static CONFIG: OnceLock<BridgeConfig> = OnceLock::new();
static PRIVILEGED: OnceLock<Arc<dyn PrivilegedHost>> = OnceLock::new();
static POOL: OnceLock<WorkerPool> = OnceLock::new();

// Serializes singleton creation so a losing racer never starts threads.
static INIT: Mutex<()> = const_mutex(());

/// Fix the process-wide configuration.
///
/// Must run before the first bridged call; afterwards the defaults (plus
/// environment overrides) are already in effect.
///
/// # Errors
///
/// - [`Error::Config`] when `config` does not validate
/// - [`Error::AlreadyInitialized`] when a configuration is already in effect
pub fn configure(config: BridgeConfig) -> Result<()> {
    config.validate()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::AlreadyInitialized("Bridge configuration".to_string()))?;
    debug!(config = ?CONFIG.get(), "Bridge configured");
    Ok(())
}

/// The configuration in effect, fixing it from the environment if needed.
pub fn config() -> &'static BridgeConfig {
    CONFIG.get_or_init(|| {
        BridgeConfig::from_env().unwrap_or_else(|err| {
            warn!(error = %err, "Ignoring invalid bridge environment overrides");
            BridgeConfig::default()
        })
    })
}

/// Register the application's privileged context.
///
/// Call this from startup code before the first bridged call that targets
/// the privileged context.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if a host was installed before or
/// the default host has already been started.
pub fn install_privileged_host(host: Arc<dyn PrivilegedHost>) -> Result<()> {
    let _init = INIT.lock();
    if PRIVILEGED.set(host).is_err() {
        warn!("Privileged host already installed; keeping the existing one");
        return Err(Error::AlreadyInitialized("Privileged host".to_string()));
    }
    debug!("Privileged host installed");
    Ok(())
}

/// The installed privileged host, if any has been installed or started.
pub fn installed_privileged_host() -> Option<&'static Arc<dyn PrivilegedHost>> {
    PRIVILEGED.get()
}

/// Whether the calling thread is the privileged one.
///
/// Never creates the host: when none exists yet, no thread can be it.
pub fn current_thread_is_privileged() -> bool {
    PRIVILEGED
        .get()
        .is_some_and(|host| host.is_privileged_thread())
}

/// The privileged host, starting the default one if none was installed.
///
/// # Errors
///
/// - [`Error::CapabilityMissing`] without the `desktop-shims` feature when no
///   host was installed
/// - [`Error::Host`] when the default event loop thread cannot start
pub fn try_privileged_host() -> Result<&'static Arc<dyn PrivilegedHost>> {
    if let Some(host) = PRIVILEGED.get() {
        return Ok(host);
    }

    let _init = INIT.lock();
    if let Some(host) = PRIVILEGED.get() {
        return Ok(host);
    }
    let host = provide_default_privileged_host()?;
    Ok(PRIVILEGED.get_or_init(|| host))
}

/// Like [`try_privileged_host`], for callers with no way to report failure.
///
/// # Panics
///
/// Panics when [`try_privileged_host`] fails.
pub fn privileged_host() -> &'static Arc<dyn PrivilegedHost> {
    try_privileged_host()
        .unwrap_or_else(|err| panic!("core_dispatch: no privileged context: {}", err))
}

/// The shared background pool, starting it if needed.
///
/// # Errors
///
/// Returns [`Error::Internal`] when the pool's runtime cannot be built.
pub fn try_background_pool() -> Result<&'static WorkerPool> {
    if let Some(pool) = POOL.get() {
        return Ok(pool);
    }

    let _init = INIT.lock();
    if let Some(pool) = POOL.get() {
        return Ok(pool);
    }
    let config = config();
    let pool = WorkerPool::builder()
        .max_threads(config.pool_max_threads)
        .thread_name(config.pool_thread_name.clone())
        .build()
        .map_err(|e| Error::Internal(format!("Failed to start background pool: {}", e)))?;
    Ok(POOL.get_or_init(|| pool))
}

/// Like [`try_background_pool`], for callers with no way to report failure.
///
/// # Panics
///
/// Panics when [`try_background_pool`] fails.
pub fn background_pool() -> &'static WorkerPool {
    try_background_pool()
        .unwrap_or_else(|err| panic!("core_dispatch: no background pool: {}", err))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_privileged_host() -> Result<Arc<dyn PrivilegedHost>> {
    use bridge_desktop::EventLoop;

    let name = config().privileged_thread_name.clone();
    let event_loop = EventLoop::spawn(name.clone())?;
    debug!(thread = %name, "Started default privileged event loop");

    let host: Arc<dyn PrivilegedHost> = event_loop;
    Ok(host)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_privileged_host() -> Result<Arc<dyn PrivilegedHost>> {
    Err(Error::CapabilityMissing {
        capability: "PrivilegedHost".to_string(),
        message: "No privileged context has been installed. \
                 Desktop: enable the 'desktop-shims' feature to start a default event loop. \
                 Other hosts: call install_privileged_host with an adapter for the native main loop."
            .to_string(),
    })
}
