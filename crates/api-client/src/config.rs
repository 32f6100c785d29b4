//! Configuration for the OpsGenie client
//!
//! A [`Config`] is built by the caller, handed to
//! [`OpsGenieClient::new`](crate::OpsGenieClient::new) by value and never
//! changes afterwards. Only the API key is mandatory.

use crate::error::{Error, Result};
use crate::logging::LogSink;
use crate::transport::{Backoff, RetryPolicy};
use opsgenie_core::retry::{DEFAULT_RETRY_COUNT, DEFAULT_RETRY_WAIT_MAX, DEFAULT_RETRY_WAIT_MIN};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Base URL of the default (US) region
pub const API_URL: &str = "https://api.opsgenie.com";

/// Base URL of the EU region
pub const API_URL_EU: &str = "https://api.eu.opsgenie.com";

/// Service region, selecting exactly one base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApiUrl {
    /// `https://api.opsgenie.com`
    #[default]
    Default,
    /// `https://api.eu.opsgenie.com`
    Eu,
}

impl ApiUrl {
    /// Map a caller-supplied string onto a region
    ///
    /// Only [`API_URL_EU`] selects the EU region. Everything else, including
    /// the empty string and unknown hosts, selects the default region.
    pub fn parse(value: &str) -> Self {
        if value.trim() == API_URL_EU {
            Self::Eu
        } else {
            Self::Default
        }
    }

    /// Base URL for this region
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Default => API_URL,
            Self::Eu => API_URL_EU,
        }
    }
}

impl From<&str> for ApiUrl {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_url())
    }
}

/// Client configuration
#[derive(Clone)]
pub struct Config {
    /// API integration key sent as `Authorization: GenieKey <key>`
    pub api_key: String,
    /// Region
    pub api_url: ApiUrl,
    /// Route every request through this proxy
    pub proxy_url: Option<String>,
    /// Level name; unknown names fall back to `info`
    pub log_level: String,
    /// Retries after the first attempt; zero means the default of 4
    pub retry_count: u32,
    /// Use this client instead of building one
    pub http_client: Option<reqwest::Client>,
    /// Replace the default exponential backoff
    pub backoff: Option<Arc<dyn Backoff>>,
    /// Replace the default retry decision
    pub retry_policy: Option<Arc<dyn RetryPolicy>>,
    /// Per-attempt timeout for the client this crate builds
    pub timeout: Option<Duration>,
    /// Lower bound passed to the backoff
    pub retry_wait_min: Duration,
    /// Upper bound passed to the backoff
    pub retry_wait_max: Duration,
    /// Where log lines go; defaults to `tracing`
    pub log_sink: Option<Arc<dyn LogSink>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: ApiUrl::Default,
            proxy_url: None,
            log_level: String::new(),
            retry_count: 0,
            http_client: None,
            backoff: None,
            retry_policy: None,
            timeout: None,
            retry_wait_min: DEFAULT_RETRY_WAIT_MIN,
            retry_wait_max: DEFAULT_RETRY_WAIT_MAX,
            log_sink: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &crate::logging::redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("proxy_url", &self.proxy_url)
            .field("log_level", &self.log_level)
            .field("retry_count", &self.retry_count)
            .field("http_client", &self.http_client.is_some())
            .field("backoff", &self.backoff.is_some())
            .field("retry_policy", &self.retry_policy.is_some())
            .field("timeout", &self.timeout)
            .field("retry_wait_min", &self.retry_wait_min)
            .field("retry_wait_max", &self.retry_wait_max)
            .field("log_sink", &self.log_sink.is_some())
            .finish()
    }
}

impl Config {
    /// Configuration with the given API key and defaults for everything else
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `OPSGENIE_API_KEY`: API key (required)
    /// - `OPSGENIE_API_URL`: Region base URL; only the EU URL changes the default
    /// - `OPSGENIE_PROXY_URL`: Proxy for all requests
    /// - `OPSGENIE_LOG_LEVEL`: Log level name
    /// - `OPSGENIE_RETRY_COUNT`: Retries after the first attempt
    /// - `OPSGENIE_TIMEOUT_SECS`: Per-attempt timeout in seconds
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPSGENIE_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::missing_env("OPSGENIE_API_KEY"))?;

        let api_url = env::var("OPSGENIE_API_URL")
            .map(|url| ApiUrl::parse(&url))
            .unwrap_or_default();

        let proxy_url = env::var("OPSGENIE_PROXY_URL")
            .ok()
            .filter(|url| !url.is_empty());

        let log_level = env::var("OPSGENIE_LOG_LEVEL").unwrap_or_default();

        let retry_count = env::var("OPSGENIE_RETRY_COUNT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let timeout = env::var("OPSGENIE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);

        Ok(Self {
            api_key,
            api_url,
            proxy_url,
            log_level,
            retry_count,
            timeout,
            ..Self::default()
        })
    }

    /// Builder-style method to set the region
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<ApiUrl>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Builder-style method to set the proxy
    #[must_use]
    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    /// Builder-style method to set the log level name
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Builder-style method to set the retry count
    #[must_use]
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Builder-style method to inject an HTTP client
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builder-style method to set a custom backoff
    #[must_use]
    pub fn with_backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    /// Builder-style method to set a custom retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry_policy = Some(Arc::new(policy));
        self
    }

    /// Builder-style method to set the per-attempt timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builder-style method to set the backoff bounds
    #[must_use]
    pub fn with_retry_wait(mut self, min: Duration, max: Duration) -> Self {
        self.retry_wait_min = min;
        self.retry_wait_max = max;
        self
    }

    /// Builder-style method to set the log sink
    #[must_use]
    pub fn with_log_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.log_sink = Some(Arc::new(sink));
        self
    }

    /// Retries allowed after the first attempt
    pub fn effective_retry_count(&self) -> u32 {
        if self.retry_count == 0 {
            DEFAULT_RETRY_COUNT
        } else {
            self.retry_count
        }
    }

    /// Parsed proxy, if one is configured
    pub fn proxy(&self) -> Result<Option<reqwest::Proxy>> {
        let Some(raw) = self.proxy_url.as_deref().filter(|url| !url.is_empty()) else {
            return Ok(None);
        };
        let url = reqwest::Url::parse(raw)
            .map_err(|e| Error::config(format!("Invalid proxy URL {raw}: {e}")))?;
        let proxy = reqwest::Proxy::all(url)
            .map_err(|e| Error::config(format!("Invalid proxy URL {raw}: {e}")))?;
        Ok(Some(proxy))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::config("API key cannot be blank"));
        }

        if self.retry_wait_min > self.retry_wait_max {
            return Err(Error::config("retry_wait_min cannot exceed retry_wait_max"));
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::config("timeout cannot be zero"));
        }

        Ok(())
    }
}
