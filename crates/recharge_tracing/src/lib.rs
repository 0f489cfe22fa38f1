//! Tracing setup for the recharge station.
//!
//! The station crates only emit `tracing` events; they never install a
//! subscriber. Binaries call [`TracingConfig::init`] once at startup to
//! choose a level and an output format.
//!
//! # Events
//!
//! | Target | Level | Fields |
//! |--------|-------|--------|
//! | `recharge_station::mav` | `INFO` | `mav` on take-off and final landing |
//! | `recharge_station::mav` | `DEBUG` | `mav`, `state` on every phase change |
//! | `recharge_station::station` | `INFO` | `mavs` on start, on shutdown |
//! | `recharge_station::electrode` | `TRACE` | `electrode` while waiting |
//!
//! # Example
//!
//! ```
//! use recharge_tracing::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! TracingConfig::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .init();
//!
//! tracing::debug!("subscriber installed");
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

impl TracingFormat {
    /// Parses a format name (`pretty`, `compact` or `json`), ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing subscriber configuration.
///
/// # Configuration Options
///
/// ```
/// use recharge_tracing::{TracingConfig, TracingFormat};
/// use tracing::Level;
///
/// // Watching every phase change of every MAV
/// let dev = TracingConfig::default()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);
///
/// // Only station lifecycle, as JSON
/// let prod = TracingConfig::default()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("recharge_station::station=info,recharge_station::mav=warn");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., `recharge_station=debug,recharge_station::electrode=trace`).
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`. Takes precedence over the
    /// level; an unparsable filter falls back to the level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configured level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the configured format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    /// Builds the filter this configuration installs.
    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Installs the global subscriber.
    ///
    /// Does nothing if a global subscriber is already installed, so tests and
    /// embedding applications can call it freely.
    pub fn init(&self) {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init().ok() ignores errors if already initialized
        let registry = tracing_subscriber::registry().with(self.filter());
        match self.format {
            TracingFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .ok(),
            TracingFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .ok(),
            TracingFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .ok(),
        };

        tracing::debug!(level = %self.level, format = ?self.format, "tracing initialized");
    }
}
