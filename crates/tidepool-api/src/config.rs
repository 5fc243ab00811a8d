//! Server configuration.
//!
//! Every field has a default; `from_env` overrides them from `TIDEPOOL_*`
//! variables. A variable that is set but cannot be parsed is an error.

use std::time::Duration;

use tidepool_core::pagination::{DEFAULT_MAX_RESULTS, MAX_PAGE_SIZE, PageLimits};
use tidepool_core::{Error, Result};
use tidepool_sharing::{DEFAULT_SIGNED_URL_TTL, MAX_SIGNED_URL_TTL};

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP listen port.
    pub http_port: u16,
    /// Pretty logs instead of JSON.
    pub debug: bool,
    /// Page size used when a listing request names none.
    pub default_max_results: usize,
    /// Largest page size ever served.
    pub max_page_size: usize,
    /// Lifetime of signed file URLs.
    pub signed_url_ttl: Duration,
    /// Optional per-request timeout.
    pub request_timeout: Option<Duration>,
    /// Optional cap on in-flight requests.
    pub concurrency_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            debug: false,
            default_max_results: DEFAULT_MAX_RESULTS,
            max_page_size: MAX_PAGE_SIZE,
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
            request_timeout: None,
            concurrency_limit: None,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when a variable is malformed or out of range.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when a variable is malformed or out of range.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env { lookup };
        let mut config = Self::default();

        if let Some(port) = env.u16("TIDEPOOL_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(debug) = env.bool("TIDEPOOL_DEBUG")? {
            config.debug = debug;
        }
        if let Some(n) = env.usize("TIDEPOOL_DEFAULT_MAX_RESULTS")? {
            config.default_max_results = n;
        }
        if let Some(n) = env.usize("TIDEPOOL_MAX_PAGE_SIZE")? {
            config.max_page_size = n;
        }
        if let Some(secs) = env.u64("TIDEPOOL_SIGNED_URL_TTL_SECS")? {
            config.signed_url_ttl = Duration::from_secs(secs);
        }
        config.request_timeout = env
            .u64("TIDEPOOL_REQUEST_TIMEOUT_SECS")?
            .map(Duration::from_secs);
        config.concurrency_limit = env.usize("TIDEPOOL_CONCURRENCY_LIMIT")?;

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.default_max_results == 0 {
            return Err(Error::InvalidInput(
                "TIDEPOOL_DEFAULT_MAX_RESULTS must be at least 1".to_string(),
            ));
        }
        if self.max_page_size == 0 {
            return Err(Error::InvalidInput(
                "TIDEPOOL_MAX_PAGE_SIZE must be at least 1".to_string(),
            ));
        }
        let ttl = self.signed_url_ttl.as_secs();
        if ttl == 0 || self.signed_url_ttl > MAX_SIGNED_URL_TTL {
            return Err(Error::InvalidInput(format!(
                "TIDEPOOL_SIGNED_URL_TTL_SECS must be between 1 and {}, got {ttl}",
                MAX_SIGNED_URL_TTL.as_secs()
            )));
        }
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidInput(
                "TIDEPOOL_REQUEST_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        if self.concurrency_limit == Some(0) {
            return Err(Error::InvalidInput(
                "TIDEPOOL_CONCURRENCY_LIMIT must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Page limits handed to the sharing service.
    #[must_use]
    pub const fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_max_results: self.default_max_results,
            max_page_size: self.max_page_size,
        }
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn u16(&self, name: &str) -> Result<Option<u16>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<u16>()
            .map(Some)
            .map_err(|e| Error::InvalidInput(format!("{name} must be a u16: {e}")))
    }

    fn u64(&self, name: &str) -> Result<Option<u64>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<u64>()
            .map(Some)
            .map_err(|e| Error::InvalidInput(format!("{name} must be a u64: {e}")))
    }

    fn usize(&self, name: &str) -> Result<Option<usize>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<usize>()
            .map(Some)
            .map_err(|e| Error::InvalidInput(format!("{name} must be a usize: {e}")))
    }

    fn bool(&self, name: &str) -> Result<Option<bool>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        parse_bool(name, &v).map(Some)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}
