use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{Result, RotaError};
use crate::models::ProxyEndpoint;
use crate::proxy::RetryPolicy;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Timeout for each transport call (default: 15s)
    pub timeout: Duration,
    /// Attempts per proxy before it is marked unhealthy (default: 3)
    pub retry_budget: u32,
    /// Backoff after the first failed attempt; grows linearly (default: 100ms)
    pub backoff_base: Duration,
    /// Upper bound on a single backoff (default: 2s)
    pub backoff_cap: Duration,
    /// Proxy URLs in rotation order; empty means direct requests
    pub proxies: Vec<String>,
    /// Prefix for relative request URLs
    pub base_url: Option<String>,
    /// User-Agent sent when the request does not set one
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            retry_budget: RetryPolicy::DEFAULT_BUDGET,
            backoff_base: RetryPolicy::DEFAULT_BASE_BACKOFF,
            backoff_cap: RetryPolicy::DEFAULT_MAX_BACKOFF,
            proxies: Vec::new(),
            base_url: None,
            user_agent: Some(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = ClientConfig {
            timeout: Duration::from_secs(parse_env("ROTA_TIMEOUT", defaults.timeout.as_secs())?),
            retry_budget: parse_env("ROTA_RETRY_BUDGET", defaults.retry_budget)?,
            backoff_base: Duration::from_millis(parse_env(
                "ROTA_BACKOFF_BASE_MS",
                defaults.backoff_base.as_millis() as u64,
            )?),
            backoff_cap: Duration::from_millis(parse_env(
                "ROTA_BACKOFF_CAP_MS",
                defaults.backoff_cap.as_millis() as u64,
            )?),
            proxies: get_env_or("ROTA_PROXIES", "")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            base_url: non_empty(get_env_or("ROTA_BASE_URL", "")),
            user_agent: non_empty(get_env_or("ROTA_USER_AGENT", "")).or(defaults.user_agent),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check ranges and parse every proxy URL
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(RotaError::InvalidConfig("timeout must be greater than zero".into()));
        }
        if self.retry_budget == 0 {
            return Err(RotaError::InvalidConfig("retry budget must be at least 1".into()));
        }
        if self.backoff_cap < self.backoff_base {
            return Err(RotaError::InvalidConfig(
                "backoff cap must not be smaller than backoff base".into(),
            ));
        }
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).map_err(|e| {
                RotaError::InvalidConfig(format!("base URL must be a valid URL: {}", e))
            })?;
        }

        self.endpoints().map(|_| ())
    }

    /// Parsed proxy endpoints, in configuration order
    pub fn endpoints(&self) -> Result<Vec<ProxyEndpoint>> {
        self.proxies.iter().map(|p| ProxyEndpoint::parse(p)).collect()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_budget, self.backoff_base, self.backoff_cap)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| RotaError::InvalidConfig(format!("{} must be a valid number", key))),
        _ => Ok(default),
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
