//! Configuration module for environment variables and client settings

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::http::RetryPolicy;

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Thirty minutes without input logs the user out.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API; endpoint paths are joined onto it
    pub api_url: Url,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Retry policy for requests marked retryable
    pub retry: RetryPolicy,

    /// Idle window before an authenticated session is logged out
    pub inactivity_timeout: Duration,

    /// Credential store configuration
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// File backing the durable ("remember me") tier
    pub durable_path: PathBuf,
    /// Lifetime of a remembered credential in the durable tier
    pub remember_days: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            durable_path: base.join(".travel-client").join("credential.json"),
            remember_days: 7,
        }
    }
}

impl ClientConfig {
    /// Configuration with defaults for everything except the API location.
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            storage: StorageConfig::default(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    pub fn with_durable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage.durable_path = path.into();
        self
    }

    pub fn with_remember_days(mut self, days: i64) -> Self {
        self.storage.remember_days = days;
        self
    }

    /// Load configuration from environment variables (and a `.env` file when present)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_url = env::var("TRAVEL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&api_url)
            .with_context(|| format!("TRAVEL_API_URL is not a valid URL: {api_url}"))?;

        let mut config = Self::new(api_url)
            .with_request_timeout(Duration::from_secs(env_or("TRAVEL_REQUEST_TIMEOUT_SECS", 10)))
            .with_retry(RetryPolicy::new(
                env_or("TRAVEL_RETRY_MAX_ATTEMPTS", 3),
                Duration::from_millis(env_or("TRAVEL_RETRY_BASE_DELAY_MS", 1000)),
            ))
            .with_inactivity_timeout(Duration::from_secs(env_or(
                "TRAVEL_INACTIVITY_TIMEOUT_SECS",
                DEFAULT_INACTIVITY_TIMEOUT.as_secs(),
            )))
            .with_remember_days(env_or("TRAVEL_REMEMBER_DAYS", 7));

        if let Ok(path) = env::var("TRAVEL_DURABLE_STORE_PATH") {
            config = config.with_durable_path(path);
        }

        tracing::debug!("Loaded client configuration: {:?}", config);
        Ok(config)
    }
}

/// Parses an environment variable, falling back to `default` when unset or malformed.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
