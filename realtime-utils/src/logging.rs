//! Logging infrastructure for realtime clients
//!
//! Library crates only emit `tracing` events. Applications call one of the
//! `init_logging*` functions once at startup to install a subscriber.

use std::path::PathBuf;

use tracing_subscriber::fmt::format::{DefaultFields, FmtSpan, Format};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::{paths, Result, UtilsError};

/// Environment variable holding the default filter directive
pub const LOG_ENV_VAR: &str = "REALTIME_LOG";

const DEFAULT_LOG_FILE: &str = "realtime.log";

/// Where log records go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    /// `realtime.log` (or `file_name`) in the log directory
    File,
    Both,
}

impl LogOutput {
    fn to_stderr(self) -> bool {
        matches!(self, Self::Stderr | Self::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, Self::File | Self::Both)
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub output: LogOutput,
    /// `EnvFilter` directive, e.g. "realtime_client=debug,tungstenite=warn"
    pub filter: String,
    /// Emit span enter/exit records
    pub span_events: bool,
    pub file_line: bool,
    pub file_name: Option<String>,
}

fn env_filter_or(fallback: &str) -> String {
    std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| fallback.to_string())
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: env_filter_or("info"),
            span_events: false,
            file_line: false,
            file_name: None,
        }
    }
}

impl LogConfig {
    /// Warnings only, to a file, for apps that own the terminal
    pub fn session() -> Self {
        Self {
            output: LogOutput::File,
            filter: env_filter_or("warn"),
            ..Self::default()
        }
    }

    /// Every frame on stderr, with spans and source locations
    pub fn development() -> Self {
        Self {
            filter: "realtime_client=trace,realtime_protocol=debug,info".into(),
            span_events: true,
            file_line: true,
            ..Self::default()
        }
    }

    /// Full path of the log file this config writes to
    pub fn log_path(&self) -> PathBuf {
        paths::log_dir().join(self.file_name.as_deref().unwrap_or(DEFAULT_LOG_FILE))
    }

    fn layer<S>(
        &self,
        writer: BoxMakeWriter,
        ansi: bool,
    ) -> tracing_subscriber::fmt::Layer<S, DefaultFields, Format, BoxMakeWriter> {
        let spans = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_span_events(spans)
            .with_file(self.file_line)
            .with_line_number(self.file_line)
    }
}

/// Install the global subscriber using `REALTIME_LOG` (default "info")
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LogConfig::default())
}

/// Install the global subscriber
///
/// Fails if the filter does not parse, the log file cannot be opened, or a
/// subscriber is already installed.
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| UtilsError::config(format!("Invalid log filter: {}", e)))?;

    let stderr_layer = config
        .output
        .to_stderr()
        .then(|| config.layer(BoxMakeWriter::new(std::io::stderr), true));

    let file_layer = if config.output.to_file() {
        let file = open_log_file(&config.log_path())?;
        Some(config.layer(BoxMakeWriter::new(file), false))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| UtilsError::internal(format!("Failed to install subscriber: {}", e)))
}

fn open_log_file(path: &std::path::Path) -> Result<std::fs::File> {
    if let Some(dir) = path.parent() {
        paths::ensure_dir(dir).map_err(|source| UtilsError::FileWrite {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| UtilsError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
}
