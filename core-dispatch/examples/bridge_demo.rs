//! Walks through each execution context with a fake callback-style API.
//!
//! The process's main thread adopts the privileged event loop while the demo
//! itself runs on an ordinary application thread.
//!
//! ```text
//! cargo run -p core-dispatch --example bridge_demo
//! RUST_LOG=core_dispatch=trace cargo run -p core-dispatch --example bridge_demo
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use bridge_desktop::{EventLoop, SerialQueue};
use core_dispatch::{
    configure, current_thread_is_privileged, install_privileged_host, on_background, on_context,
    on_current, on_privileged, ExecutionContext,
};
use core_runtime::config::BridgeConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use tracing::info;

/// Stand-in for a platform API that reports through a completion callback.
fn fetch_greeting(name: String, delay: Duration, done: impl FnOnce(String) + Send + 'static) {
    thread::spawn(move || {
        thread::sleep(delay);
        done(format!("hello, {}", name));
    });
}

fn run_demo() -> anyhow::Result<()> {
    let greeting = on_current(|done| fetch_greeting("current".into(), Duration::from_millis(20), done));
    info!(%greeting, "Current context");

    let start = Instant::now();
    let greeting = on_background(|done| {
        fetch_greeting("background".into(), Duration::from_millis(50), done)
    });
    info!(%greeting, elapsed = ?start.elapsed(), "Background context");

    let (privileged, greeting) = on_privileged(|done| {
        // A blocking wait here would stall the main loop; this one pumps it.
        let nested = on_background(|inner| {
            fetch_greeting("privileged".into(), Duration::from_millis(30), inner)
        });
        done((current_thread_is_privileged(), nested))
    });
    info!(privileged, %greeting, "Privileged context");

    let queue = Arc::new(SerialQueue::new("demo-serial")?);
    let serial = ExecutionContext::named("demo-serial", queue.clone());
    let on_queue = on_context(&serial, move |done| done(queue.is_current()));
    info!(on_queue, context = %serial, "Named context");

    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_filter("bridge_demo=info,core_dispatch=debug,bridge_desktop=debug"),
    )?;

    configure(
        BridgeConfig::builder()
            .pump_interval_ms(20)
            .pool_max_threads(32)
            .build()?,
    )?;

    let main_loop = EventLoop::new("demo-main");
    install_privileged_host(main_loop.clone())?;

    let app = Arc::clone(&main_loop);
    let worker = thread::Builder::new()
        .name("demo-app".to_string())
        .spawn(move || {
            let outcome = run_demo();
            app.quit();
            outcome
        })?;

    main_loop.run()?;
    worker
        .join()
        .map_err(|_| anyhow!("demo thread panicked"))??;

    info!("Demo finished");
    Ok(())
}
