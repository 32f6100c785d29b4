//! Logging for the client
//!
//! The client never writes to a global logger directly. Every message goes
//! through a [`LogSink`], which defaults to [`TracingSink`] (plain `tracing`
//! events) and can be swapped for a recording sink in tests. Per-attempt
//! retry diagnostics are separate structured `tracing::debug!` events.

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

/// Level used when the configured name is empty or unknown
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Destination for the client's log lines
pub trait LogSink: Send + Sync {
    /// Record one message
    fn log(&self, level: Level, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(Level, &str) + Send + Sync,
{
    fn log(&self, level: Level, message: &str) {
        self(level, message);
    }
}

/// Sink forwarding to `tracing` events under the crate's target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "opsgenie_api_client", "{message}"),
            Level::WARN => tracing::warn!(target: "opsgenie_api_client", "{message}"),
            Level::INFO => tracing::info!(target: "opsgenie_api_client", "{message}"),
            Level::DEBUG => tracing::debug!(target: "opsgenie_api_client", "{message}"),
            _ => tracing::trace!(target: "opsgenie_api_client", "{message}"),
        }
    }
}

/// Level-filtered handle onto a sink
#[derive(Clone)]
pub struct Logger {
    level: LevelFilter,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("level", &self.level).finish_non_exhaustive()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LevelFilter::INFO, Arc::new(TracingSink))
    }
}

impl Logger {
    /// Create a logger passing messages at or above `level` to `sink`
    pub fn new(level: LevelFilter, sink: Arc<dyn LogSink>) -> Self {
        Self { level, sink }
    }

    /// Whether a message at `level` would reach the sink
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    /// Send `message` to the sink if `level` is enabled
    pub fn log(&self, level: Level, message: &str) {
        if self.enabled(level) {
            self.sink.log(level, message);
        }
    }

    /// Log at error level
    pub fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }

    /// Log at warn level
    pub fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    /// Log at info level
    pub fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    /// Log at debug level
    pub fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }
}

/// Parse a level name case-insensitively into a filter and its canonical name
///
/// `warning` is accepted for `warn`; `fatal` and `panic` map to `error`.
/// Returns `None` for anything else, including the empty string.
pub fn parse_level(name: &str) -> Option<(LevelFilter, &'static str)> {
    let parsed = match name.trim().to_ascii_lowercase().as_str() {
        "trace" => (LevelFilter::TRACE, "trace"),
        "debug" => (LevelFilter::DEBUG, "debug"),
        "info" => (LevelFilter::INFO, "info"),
        "warn" | "warning" => (LevelFilter::WARN, "warn"),
        "error" | "fatal" | "panic" => (LevelFilter::ERROR, "error"),
        "off" => (LevelFilter::OFF, "off"),
        _ => return None,
    };
    Some(parsed)
}

/// Mask a secret, keeping only its last four characters
pub fn redact(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}

/// Install a global `tracing` subscriber for host programs
///
/// `RUST_LOG` takes precedence over `level` when set. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| Error::config(format!("Invalid log filter: {e}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer::layer().with_target(true).compact())
        .try_init()
        .map_err(|e| Error::config(format!("Failed to set tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(Level, String)>>);

    impl LogSink for Recorder {
        fn log(&self, level: Level, message: &str) {
            self.0.lock().unwrap().push((level, message.to_string()));
        }
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some((LevelFilter::DEBUG, "debug")));
        assert_eq!(parse_level("Warning"), Some((LevelFilter::WARN, "warn")));
        assert_eq!(parse_level("fatal"), Some((LevelFilter::ERROR, "error")));
        assert_eq!(parse_level("verbose"), None);
        assert_eq!(parse_level(""), None);
    }

    #[test]
    fn test_logger_filters_below_level() {
        let recorder = Arc::new(Recorder::default());
        let logger = Logger::new(LevelFilter::WARN, recorder.clone());

        logger.debug("hidden");
        logger.info("hidden");
        logger.warn("shown");
        logger.error("shown too");

        let lines = recorder.0.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (Level::WARN, "shown".to_string()));
        assert_eq!(lines[1].0, Level::ERROR);
    }

    #[test]
    fn test_off_silences_everything() {
        let recorder = Arc::new(Recorder::default());
        let logger = Logger::new(LevelFilter::OFF, recorder.clone());
        logger.error("nope");
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let sink = move |level: Level, message: &str| {
            captured.lock().unwrap().push(format!("{level} {message}"));
        };
        Logger::new(LevelFilter::INFO, Arc::new(sink)).info("hello");
        assert_eq!(seen.lock().unwrap().as_slice(), ["INFO hello"]);
    }

    #[test]
    fn test_redact() {
        assert_eq!(redact("0123456789abcdef"), "****cdef");
        assert_eq!(redact("abc"), "****");
        assert_eq!(redact(""), "****");
    }
}
