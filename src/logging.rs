/// Structured logging for the analysis engine
///
/// Log events are emitted through `tracing` and tagged with the engine
/// component that produced them. The subscriber is installed once by the
/// binary (or by an embedding application); library code only emits events
/// and never installs a subscriber itself.

use std::fmt;

use serde::Deserialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine components
// ---------------------------------------------------------------------------

/// Which part of the crate emitted a log event. Recorded as the
/// `component` field on every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Ingest,
    Quality,
    Outliers,
    Remediation,
    Nighttime,
    Aggregation,
    Correlation,
    Summary,
    Report,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Ingest => write!(f, "INGEST"),
            Component::Quality => write!(f, "QUALITY"),
            Component::Outliers => write!(f, "OUTLIERS"),
            Component::Remediation => write!(f, "REMEDIATION"),
            Component::Nighttime => write!(f, "NIGHTTIME"),
            Component::Aggregation => write!(f, "AGGREGATION"),
            Component::Correlation => write!(f, "CORRELATION"),
            Component::Summary => write!(f, "SUMMARY"),
            Component::Report => write!(f, "REPORT"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `min_level` when set. Returns `false`
/// if a subscriber was already installed (e.g. by a test harness).
pub fn init_logger(min_level: LogLevel, console_timestamps: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(min_level.as_directive()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if console_timestamps {
        builder.try_init().is_ok()
    } else {
        builder.without_time().try_init().is_ok()
    }
}

// ---------------------------------------------------------------------------
// Operation summaries
// ---------------------------------------------------------------------------

/// Severity for an operation that touched `affected` of `total` items.
///
/// Nothing touched is routine; touching everything usually means a bad
/// threshold or range and is worth a warning.
pub fn summary_level(total: usize, affected: usize) -> LogLevel {
    if affected == 0 {
        LogLevel::Debug
    } else if affected >= total {
        LogLevel::Warning
    } else {
        LogLevel::Info
    }
}

/// Log how many rows/values an operation affected.
pub fn log_operation_summary(component: Component, operation: &str, total: usize, affected: usize) {
    let message = format!("{}: {}/{} affected", operation, affected, total);
    match summary_level(total, affected) {
        LogLevel::Debug => debug!(component = %component, "{}", message),
        LogLevel::Info => info!(component = %component, "{}", message),
        LogLevel::Warning | LogLevel::Error => warn!(component = %component, "{}", message),
    }
}
