//! # Logging
//!
//! Installs the process-wide `tracing` subscriber for the bridge crates.
//!
//! Output goes to stdout in one of three [`LogFormat`]s, filtered per crate
//! through `EnvFilter`. A host [`LoggerSink`] can be attached to receive a
//! copy of every event that passes the filter.
//!
//! Sink delivery never happens on the emitting thread. Events are queued to a
//! `syncbridge-log` thread that awaits the sink, so a slow host logger cannot
//! stall the privileged thread in the middle of a cooperative wait.
//!
//! ```ignore
//! use bridge_traits::logging::{ConsoleLogger, LogLevel};
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use std::sync::Arc;
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_level(LogLevel::Debug)
//!         .with_logger_sink(Arc::new(ConsoleLogger::default())),
//! )?;
//! tracing::info!(target: "core_dispatch", "logging ready");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use bridge_traits::logging::{LogEntry, LogLevel, LoggerSink};
use core_async::runtime;
use core_async::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

use crate::error::{Error, Result};

/// Crates that follow [`LoggingConfig::level`]; everything else logs at `warn`.
const WORKSPACE_TARGETS: &[&str] = &[
    "syncbridge",
    "core_dispatch",
    "core_async",
    "core_runtime",
    "bridge_desktop",
];

const FORWARDER_THREAD: &str = "syncbridge-log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored; for development.
    Pretty,
    /// One JSON object per event.
    Json,
    /// One line per event.
    Compact,
}

impl Default for LogFormat {
    /// `Pretty` in debug builds, `Json` in release builds.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level for the workspace crates when no custom filter is set.
    pub level: LogLevel,
    /// Full `EnvFilter` directive string; replaces the level-based default.
    pub filter: Option<String>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Emit an event when each span opens and closes.
    pub enable_spans: bool,
    pub display_target: bool,
    /// Show thread ids and names. On by default: which thread ran an
    /// operation or fired its callback is usually the question.
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            logger_sink: None,
            enable_spans: false,
            display_target: true,
            display_thread_info: true,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field("logger_sink", &self.logger_sink.is_some())
            .field("enable_spans", &self.enable_spans)
            .field("display_target", &self.display_target)
            .field("display_thread_info", &self.display_thread_info)
            .finish()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }

    fn filter_directives(&self) -> String {
        match &self.filter {
            Some(custom) => custom.clone(),
            None => std::iter::once("warn".to_string())
                .chain(
                    WORKSPACE_TARGETS
                        .iter()
                        .map(|target| format!("{}={}", target, self.level)),
                )
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// - [`Error::Config`] when the filter does not parse (nothing is installed)
/// - [`Error::Internal`] when the sink forwarding thread cannot start
/// - [`Error::AlreadyInitialized`] when a global subscriber already exists
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;
    let sink_layer = match &config.logger_sink {
        Some(sink) => Some(LoggerSinkLayer::start(Arc::clone(sink))?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(sink_layer)
        .with(fmt_layer(&config))
        .try_init()
        .map_err(|e| Error::AlreadyInitialized(format!("Global tracing subscriber ({})", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(config.filter_directives())
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

fn fmt_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_span_events(span_events)
        .with_writer(io::stdout);

    match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().boxed(),
        LogFormat::Json => base
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .boxed(),
    }
}

/// Mirrors events into a [`LoggerSink`] through a forwarding thread.
struct LoggerSinkLayer {
    sender: mpsc::UnboundedSender<LogEntry>,
    min_level: LogLevel,
    forwarder: ThreadId,
}

impl LoggerSinkLayer {
    fn start(sink: Arc<dyn LoggerSink>) -> Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<LogEntry>();
        let min_level = sink.min_level();

        let handle = thread::Builder::new()
            .name(FORWARDER_THREAD.to_string())
            .spawn(move || {
                runtime::block_on(async move {
                    while let Some(entry) = receiver.recv().await {
                        if let Err(err) = sink.log(entry).await {
                            eprintln!("LoggerSink error: {}", err);
                        }
                    }
                    if let Err(err) = sink.flush().await {
                        eprintln!("LoggerSink flush error: {}", err);
                    }
                })
            })
            .map_err(|e| Error::Internal(format!("Failed to start log forwarder: {}", e)))?;

        Ok(Self {
            sender,
            min_level,
            forwarder: handle.thread().id(),
        })
    }
}

impl<S> Layer<S> for LoggerSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        // A sink that logs through tracing would otherwise feed itself.
        if thread::current().id() == self.forwarder {
            return;
        }

        let metadata = event.metadata();
        let level = log_level(metadata.level());
        if level < self.min_level {
            return;
        }

        let mut visitor = SinkVisitor::default();
        event.record(&mut visitor);

        let message = visitor
            .message
            .take()
            .unwrap_or_else(|| metadata.name().to_string());
        let mut entry = LogEntry::new(level, metadata.target(), message);
        entry.fields = visitor.fields;
        if let Some(span) = ctx.lookup_current() {
            entry.span = Some(span.name().to_string());
        }

        // Only fails once the forwarder is gone, i.e. during process exit.
        let _ = self.sender.send(entry);
    }
}

#[derive(Default)]
struct SinkVisitor {
    message: Option<String>,
    fields: BTreeMap<String, String>,
}

impl SinkVisitor {
    fn record_value(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            name => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for SinkVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, format!("{:?}", value));
    }
}

fn log_level(level: &Level) -> LogLevel {
    if *level == Level::ERROR {
        LogLevel::Error
    } else if *level == Level::WARN {
        LogLevel::Warn
    } else if *level == Level::INFO {
        LogLevel::Info
    } else if *level == Level::DEBUG {
        LogLevel::Debug
    } else {
        LogLevel::Trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as SinkResult};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    struct CollectingSink {
        entries: Mutex<Vec<LogEntry>>,
        min_level: LogLevel,
    }

    impl CollectingSink {
        fn new(min_level: LogLevel) -> Arc<Self> {
            Arc::new(Self {
                entries: Mutex::new(Vec::new()),
                min_level,
            })
        }

        /// Wait for the forwarder to deliver `count` entries.
        fn wait_for(&self, count: usize) -> Vec<LogEntry> {
            let deadline = Instant::now() + Duration::from_secs(5);
            loop {
                let entries = self.entries.lock().unwrap().clone();
                if entries.len() >= count || Instant::now() >= deadline {
                    return entries;
                }
                thread::sleep(Duration::from_millis(5));
            }
        }
    }

    #[async_trait]
    impl LoggerSink for CollectingSink {
        async fn log(&self, entry: LogEntry) -> SinkResult<()> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }

        fn min_level(&self) -> LogLevel {
            self.min_level
        }
    }

    #[test]
    fn test_default_directives_cover_workspace() {
        let config = LoggingConfig::default().with_level(LogLevel::Debug);
        let directives = config.filter_directives();

        assert!(directives.starts_with("warn,"));
        for target in WORKSPACE_TARGETS {
            assert!(directives.contains(&format!("{}=debug", target)));
        }
        assert!(build_filter(&config).is_ok());
    }

    #[test]
    fn test_custom_filter_replaces_defaults() {
        let config = LoggingConfig::default()
            .with_level(LogLevel::Error)
            .with_filter("core_dispatch=trace");
        assert_eq!(config.filter_directives(), "core_dispatch=trace");
    }

    #[test]
    fn test_unparseable_filter_is_config_error() {
        let config = LoggingConfig::default().with_filter("core_dispatch=notalevel");
        assert!(matches!(build_filter(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_and_debug() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_spans(true)
            .with_target(false)
            .with_thread_info(false);

        assert_eq!(config.format, LogFormat::Json);
        assert!(config.enable_spans);
        assert!(!config.display_target);
        assert!(!config.display_thread_info);
        assert!(format!("{:?}", config).contains("logger_sink: false"));
    }

    #[test]
    fn test_sink_receives_event_with_emitting_thread() {
        let sink = CollectingSink::new(LogLevel::Trace);
        let layer = LoggerSinkLayer::start(sink.clone()).unwrap();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(layer));

        tracing::info!(target: "core_dispatch", context = "privileged", steps = 3u64, "Gate opened");

        let entries = sink.wait_for(1);
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.target, "core_dispatch");
        assert_eq!(entry.message, "Gate opened");
        assert_eq!(entry.fields.get("context").map(String::as_str), Some("privileged"));
        assert_eq!(entry.fields.get("steps").map(String::as_str), Some("3"));
        assert_eq!(entry.thread.as_deref(), thread::current().name());
    }

    #[test]
    fn test_sink_min_level_drops_quieter_events() {
        let sink = CollectingSink::new(LogLevel::Warn);
        let layer = LoggerSinkLayer::start(sink.clone()).unwrap();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(layer));

        tracing::debug!("dropped");
        tracing::warn!("kept");
        tracing::error!("kept too");

        let messages: Vec<_> = sink.wait_for(2).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["kept", "kept too"]);
    }

    /// Rejects entries whose message starts with "reject".
    struct PickySink {
        accepted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LoggerSink for PickySink {
        async fn log(&self, entry: LogEntry) -> SinkResult<()> {
            if entry.message.starts_with("reject") {
                return Err(BridgeError::Sink(format!("refused '{}'", entry.message)));
            }
            self.accepted.lock().unwrap().push(entry.message);
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_does_not_stop_forwarding() {
        let sink = Arc::new(PickySink {
            accepted: Mutex::new(Vec::new()),
        });
        let layer = LoggerSinkLayer::start(sink.clone()).unwrap();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(layer));

        tracing::info!("first");
        tracing::info!("rejected by the sink");
        tracing::info!("third");

        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.accepted.lock().unwrap().len() < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(*sink.accepted.lock().unwrap(), vec!["first", "third"]);
    }

    #[test]
    fn test_sink_entry_carries_span_name() {
        let sink = CollectingSink::new(LogLevel::Trace);
        let layer = LoggerSinkLayer::start(sink.clone()).unwrap();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(layer));

        let span = tracing::debug_span!("run_and_wait");
        span.in_scope(|| tracing::trace!("Submitting operation"));

        let entries = sink.wait_for(1);
        assert_eq!(entries[0].span.as_deref(), Some("run_and_wait"));
    }
}
