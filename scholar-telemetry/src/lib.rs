//! # scholar-telemetry
//!
//! Logging for Scholar binaries and tests.
//!
//! - [`init_telemetry`] installs a human-readable `tracing` subscriber.
//! - [`init_with_config`] picks pretty or JSON output and the default filter.
//! - [`init_with_storage`] additionally captures every event in a
//!   [`SharedLogStorage`](memory::SharedLogStorage).
//!
//! `RUST_LOG` always overrides the configured default filter. Console output
//! goes to stderr unless [`LogTarget::Stdout`] is chosen, so a binary's own
//! stdout stays clean.
//!
//! ```rust,ignore
//! scholar_telemetry::init_telemetry("scholar")?;
//! tracing::info!(chunk_count = 12, "ingested document");
//! ```

pub mod memory;

#[cfg(test)]
mod test_capture;

use std::io::IsTerminal;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

pub use memory::{InMemoryLogLayer, LogRecord, SharedLogStorage};
pub use tracing::{Level, Span, debug, error, info, instrument, trace, warn};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The default filter string does not parse.
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// The rejected filter.
        filter: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber is already installed.
    #[error("Telemetry already initialized: {0}")]
    AlreadyInitialized(String),

    /// The log format name is not recognised.
    #[error("Unknown log format '{0}' (expected 'pretty' or 'json')")]
    UnknownFormat(String),
}

/// A convenience result type for telemetry setup.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Output format of the console log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

/// Stream the console layer writes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Standard error; keeps stdout for program output.
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
}

/// Settings for [`init_with_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event.
    pub service_name: String,
    /// Console output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Console stream.
    #[serde(default)]
    pub target: LogTarget,
    /// Filter used when `RUST_LOG` is unset, in `EnvFilter` syntax.
    #[serde(default = "default_filter")]
    pub default_filter: String,
}

fn default_filter() -> String {
    DEFAULT_FILTER.to_string()
}

impl TelemetryConfig {
    /// Config with pretty output on stderr and the [`DEFAULT_FILTER`].
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            format: LogFormat::Pretty,
            target: LogTarget::Stderr,
            default_filter: default_filter(),
        }
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the console stream.
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the filter used when `RUST_LOG` is unset.
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.default_filter).map_err(|e| TelemetryError::InvalidFilter {
            filter: self.default_filter.clone(),
            message: e.to_string(),
        })
    }
}

/// Install a pretty console subscriber for `service_name`.
///
/// # Errors
///
/// Returns [`TelemetryError::AlreadyInitialized`] if a global subscriber
/// exists.
pub fn init_telemetry(service_name: &str) -> Result<()> {
    init_with_config(TelemetryConfig::new(service_name))
}

/// Install a console subscriber configured by `config`.
pub fn init_with_config(config: TelemetryConfig) -> Result<()> {
    install(&config, None)
}

/// Install a console subscriber that also records every event in `storage`.
pub fn init_with_storage(service_name: &str, storage: Arc<SharedLogStorage>) -> Result<()> {
    install(&TelemetryConfig::new(service_name), Some(storage))
}

fn install(config: &TelemetryConfig, storage: Option<Arc<SharedLogStorage>>) -> Result<()> {
    let filter = config.env_filter()?;

    let console = match config.target {
        LogTarget::Stderr => console_layer(config.format, std::io::stderr, std::io::stderr().is_terminal()),
        LogTarget::Stdout => console_layer(config.format, std::io::stdout, std::io::stdout().is_terminal()),
    };

    tracing_subscriber::registry()
        .with(console.with_filter(filter))
        .with(storage.map(InMemoryLogLayer::new))
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(service.name = %config.service_name, format = ?config.format, "telemetry initialized");
    Ok(())
}

/// The fmt layer for `format`, writing to `writer`. Colours only when `ansi`.
fn console_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer().with_writer(writer).with_ansi(ansi).with_target(true).compact().boxed(),
        LogFormat::Json => fmt::layer().with_writer(writer).with_ansi(false).json().with_current_span(true).boxed(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Mutex, PoisonError};

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap_or_else(PoisonError::into_inner)).into_owned()
        }
    }

    #[test]
    fn console_logs_go_to_stderr_by_default() {
        assert_eq!(TelemetryConfig::new("scholar").target, LogTarget::Stderr);
        let config: TelemetryConfig = serde_json::from_str(r#"{"service_name":"scholar","target":"stdout"}"#).unwrap();
        assert_eq!(config.target, LogTarget::Stdout);
    }

    #[test]
    fn console_layer_writes_plain_lines_to_its_writer() {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber =
            tracing_subscriber::registry().with(console_layer(LogFormat::Pretty, move || writer.clone(), false));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(style = "academic", "requirements ignored");
        });

        let output = buffer.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains("requirements ignored"));
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn log_format_parses_names() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!("xml".parse::<LogFormat>(), Err(TelemetryError::UnknownFormat(_))));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: TelemetryConfig = serde_json::from_str(r#"{"service_name":"scholar"}"#).unwrap();
        assert_eq!(config, TelemetryConfig::new("scholar"));
    }

    #[test]
    fn config_builder_sets_fields() {
        let config = TelemetryConfig::new("svc").with_format(LogFormat::Json).with_default_filter("debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.default_filter, "debug");
    }
}
