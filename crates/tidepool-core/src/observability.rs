//! Observability infrastructure for Tidepool.
//!
//! Structured logging with consistent spans. Secrets carried by catalog
//! entities are redacted by their `Debug` impls, so spans may include entities.

use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Filter used in debug mode when `RUST_LOG` is unset.
pub const DEBUG_FILTER: &str = "info,tidepool_core=debug,tidepool_catalog=debug,tidepool_sharing=debug,tidepool_api=debug,tower_http=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

/// How the server logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Filter directives applied when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Debug mode logs pretty output with tidepool crates at `debug`;
    /// otherwise JSON at `info`.
    #[must_use]
    pub fn for_debug(debug: bool) -> Self {
        if debug {
            Self {
                format: LogFormat::Pretty,
                default_filter: DEBUG_FILTER.to_string(),
            }
        } else {
            Self::default()
        }
    }

    /// `RUST_LOG` when set and valid, else the configured default.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Installs the global subscriber.
///
/// Returns `false` when a subscriber was already installed, in which case the
/// existing one is kept.
///
/// ```rust
/// use tidepool_core::observability::{LoggingConfig, init_logging};
///
/// init_logging(&LoggingConfig::for_debug(true));
/// assert!(!init_logging(&LoggingConfig::default()));
/// ```
pub fn init_logging(config: &LoggingConfig) -> bool {
    let registry = tracing_subscriber::registry().with(config.env_filter());
    let installed = match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    };
    installed.is_ok()
}

/// Creates a span for catalog mutations.
#[must_use]
pub fn catalog_span(operation: &str, resource: &str, name: &str) -> Span {
    tracing::info_span!("catalog", op = operation, resource = resource, name = name)
}

/// Creates a span for a sharing read against one shared table.
///
/// # Example
///
/// ```rust
/// use tidepool_core::observability::sharing_span;
///
/// let span = sharing_span("query_table", "sh1", "sc1", "t1");
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn sharing_span(operation: &str, share: &str, schema: &str, table: &str) -> Span {
    tracing::info_span!(
        "sharing",
        op = operation,
        share = share,
        schema = schema,
        table = table,
    )
}
